use super::store::{RosterStore, RosterUnitOfWork, StoreError};
use crate::entities::registrations::{Registrant, list_registrants};
use crate::entities::teams::{DeleteTeam, ListInactiveTeams, NewMembership, Team, TeamRef};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL-backed [`RosterStore`].
#[derive(Debug, Clone)]
pub struct PgRosterStore {
    db: DatabaseProcessor,
}

impl PgRosterStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RosterStore for PgRosterStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        Ok(PgUnitOfWork {
            tx: self.db.pool.begin().await?,
        })
    }

    async fn list_inactive_teams(&self, tournament_id: &str) -> Result<Vec<TeamRef>, StoreError> {
        let teams = self
            .db
            .process(ListInactiveTeams {
                tournament_id: tournament_id.to_owned(),
            })
            .await?;
        Ok(teams)
    }

    async fn delete_team(&self, team_id: i32) -> Result<bool, StoreError> {
        Ok(self.db.process(DeleteTeam { team_id }).await?)
    }
}

#[async_trait]
impl RosterUnitOfWork for PgUnitOfWork {
    async fn list_registrants(&mut self) -> Result<Vec<Registrant>, StoreError> {
        Ok(list_registrants(&mut *self.tx).await?)
    }

    async fn mark_all_inactive(&mut self, tournament_id: &str) -> Result<u64, StoreError> {
        Ok(Team::mark_all_inactive_tx(&mut self.tx, tournament_id).await?)
    }

    async fn upsert_active_team(
        &mut self,
        tournament_id: &str,
        team_name: &str,
    ) -> Result<i32, StoreError> {
        Ok(Team::upsert_active_tx(&mut self.tx, tournament_id, team_name).await?)
    }

    async fn replace_members(
        &mut self,
        team_id: i32,
        members: &[NewMembership],
    ) -> Result<(), StoreError> {
        Team::replace_members_tx(&mut self.tx, team_id, members).await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
