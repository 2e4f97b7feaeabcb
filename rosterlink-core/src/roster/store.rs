use crate::entities::registrations::Registrant;
use crate::entities::teams::{NewMembership, TeamRef};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence seam of the roster synchroniser.
///
/// Writes of the mark phase go through a [`RosterUnitOfWork`]; the sweep
/// runs outside it, one team at a time.
#[async_trait]
pub trait RosterStore: Send + Sync {
    type UnitOfWork: RosterUnitOfWork;

    /// Open an atomic unit of work.
    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError>;

    /// Teams of the tournament that are currently inactive.
    async fn list_inactive_teams(&self, tournament_id: &str) -> Result<Vec<TeamRef>, StoreError>;

    /// Delete a team and its memberships.
    async fn delete_team(&self, team_id: i32) -> Result<bool, StoreError>;
}

/// An open transaction. Dropping it without [`commit`](Self::commit)
/// discards every write made through it.
#[async_trait]
pub trait RosterUnitOfWork: Send {
    /// Registrants eligible for member resolution, oldest registration first.
    async fn list_registrants(&mut self) -> Result<Vec<Registrant>, StoreError>;

    async fn mark_all_inactive(&mut self, tournament_id: &str) -> Result<u64, StoreError>;

    /// Insert or re-activate a team by name, returning its id.
    async fn upsert_active_team(
        &mut self,
        tournament_id: &str,
        team_name: &str,
    ) -> Result<i32, StoreError>;

    async fn replace_members(
        &mut self,
        team_id: i32,
        members: &[NewMembership],
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
