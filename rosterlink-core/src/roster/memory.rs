//! In-memory [`RosterStore`] for tests, with failure injection.

use super::store::{RosterStore, RosterUnitOfWork, StoreError};
use crate::entities::registrations::Registrant;
use crate::entities::teams::{NewMembership, TeamRef};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoryTeam {
    pub team_id: i32,
    pub tournament_id: String,
    pub team_name: String,
    pub is_active: bool,
    pub members: Vec<NewMembership>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    teams: Vec<MemoryTeam>,
    next_team_id: i32,
}

#[derive(Debug, Default)]
struct State {
    registrants: Vec<Registrant>,
    tables: Tables,
    fail_upsert_of: Option<String>,
    fail_delete_of: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryRosterStore {
    state: Arc<Mutex<State>>,
}

impl MemoryRosterStore {
    pub fn with_registrants(registrants: Vec<Registrant>) -> Self {
        let store = Self::default();
        store.lock().registrants = registrants;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next upserts of `team_name` fail.
    pub fn fail_upsert_of(&self, team_name: &str) {
        self.lock().fail_upsert_of = Some(team_name.to_owned());
    }

    /// Make deletes of `team_name` fail.
    pub fn fail_delete_of(&self, team_name: &str) {
        self.lock().fail_delete_of = Some(team_name.to_owned());
    }

    /// Committed teams, ordered by id.
    pub fn snapshot(&self) -> Vec<MemoryTeam> {
        let mut teams = self.lock().tables.teams.clone();
        teams.sort_by_key(|t| t.team_id);
        teams
    }

    pub fn team_names(&self, tournament_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .tables
            .teams
            .iter()
            .filter(|t| t.tournament_id == tournament_id)
            .map(|t| t.team_name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn resolved_user(&self, team_name: &str, member: &str) -> Option<i64> {
        self.lock()
            .tables
            .teams
            .iter()
            .find(|t| t.team_name == team_name)
            .and_then(|t| t.members.iter().find(|m| m.member_display_name == member))
            .and_then(|m| m.resolved_user_id)
    }
}

pub(crate) struct MemoryUnitOfWork {
    store: MemoryRosterStore,
    staged: Tables,
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        let staged = self.lock().tables.clone();
        Ok(MemoryUnitOfWork {
            store: self.clone(),
            staged,
        })
    }

    async fn list_inactive_teams(&self, tournament_id: &str) -> Result<Vec<TeamRef>, StoreError> {
        let mut teams: Vec<TeamRef> = self
            .lock()
            .tables
            .teams
            .iter()
            .filter(|t| t.tournament_id == tournament_id && !t.is_active)
            .map(|t| TeamRef {
                team_id: t.team_id,
                team_name: t.team_name.clone(),
            })
            .collect();
        teams.sort_by(|a, b| a.team_name.cmp(&b.team_name));
        Ok(teams)
    }

    async fn delete_team(&self, team_id: i32) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let failing = state.fail_delete_of.clone();
        let tables = &mut state.tables;
        let Some(position) = tables.teams.iter().position(|t| t.team_id == team_id) else {
            return Ok(false);
        };
        if failing.as_deref() == Some(tables.teams[position].team_name.as_str()) {
            return Err(StoreError::Unavailable("injected delete failure".to_string()));
        }
        tables.teams.remove(position);
        Ok(true)
    }
}

#[async_trait]
impl RosterUnitOfWork for MemoryUnitOfWork {
    async fn list_registrants(&mut self) -> Result<Vec<Registrant>, StoreError> {
        Ok(self.store.lock().registrants.clone())
    }

    async fn mark_all_inactive(&mut self, tournament_id: &str) -> Result<u64, StoreError> {
        let mut marked = 0;
        for team in self
            .staged
            .teams
            .iter_mut()
            .filter(|t| t.tournament_id == tournament_id)
        {
            team.is_active = false;
            marked += 1;
        }
        Ok(marked)
    }

    async fn upsert_active_team(
        &mut self,
        tournament_id: &str,
        team_name: &str,
    ) -> Result<i32, StoreError> {
        if self.store.lock().fail_upsert_of.as_deref() == Some(team_name) {
            return Err(StoreError::Unavailable("injected upsert failure".to_string()));
        }
        if let Some(team) = self
            .staged
            .teams
            .iter_mut()
            .find(|t| t.tournament_id == tournament_id && t.team_name == team_name)
        {
            team.is_active = true;
            return Ok(team.team_id);
        }
        self.staged.next_team_id += 1;
        let team_id = self.staged.next_team_id;
        self.staged.teams.push(MemoryTeam {
            team_id,
            tournament_id: tournament_id.to_owned(),
            team_name: team_name.to_owned(),
            is_active: true,
            members: Vec::new(),
        });
        Ok(team_id)
    }

    async fn replace_members(
        &mut self,
        team_id: i32,
        members: &[NewMembership],
    ) -> Result<(), StoreError> {
        let team = self
            .staged
            .teams
            .iter_mut()
            .find(|t| t.team_id == team_id)
            .ok_or_else(|| StoreError::Unavailable(format!("no team {team_id}")))?;
        team.members = members.to_vec();
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.store.lock().tables = self.staged;
        Ok(())
    }
}
