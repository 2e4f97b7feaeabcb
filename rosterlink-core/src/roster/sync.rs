use super::store::{RosterStore, RosterUnitOfWork, StoreError};
use crate::entities::teams::NewMembership;
use crate::matching::IdentityIndex;
use crate::quality::DataQualityNote;
use rosterlink_sdk::objects::{ExternalTeam, ExternalTeamMember};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// A team the sweep could not delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub team_id: i32,
    pub team_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Teams upserted from the snapshot.
    pub updated_team_count: usize,
    /// Names of the teams deleted by the sweep.
    pub removed_teams: Vec<String>,
    pub sweep_failures: Vec<SweepFailure>,
    pub notes: Vec<DataQualityNote>,
    /// Membership rows resolved to a local account.
    pub resolved_members: usize,
    /// Membership rows written.
    pub total_members: usize,
}

/// A snapshot team after hygiene: trimmed name, unique members.
struct PlannedTeam<'a> {
    name: &'a str,
    members: Vec<(&'a str, &'a ExternalTeamMember)>,
}

/// Drop unusable entries from a snapshot, recording a note for each.
fn plan_snapshot<'a>(
    teams: &'a [ExternalTeam],
    notes: &mut Vec<DataQualityNote>,
) -> Vec<PlannedTeam<'a>> {
    let mut seen_teams: HashSet<&str> = HashSet::with_capacity(teams.len());
    let mut planned = Vec::with_capacity(teams.len());

    for (position, team) in teams.iter().enumerate() {
        let name = team.team_name.trim();
        if name.is_empty() {
            warn!(position, "Skipping team with empty name");
            notes.push(DataQualityNote::EmptyTeamName { position });
            continue;
        }
        if !seen_teams.insert(name) {
            warn!(team_name = name, "Skipping repeated team");
            notes.push(DataQualityNote::DuplicateTeamName {
                team_name: name.to_owned(),
            });
            continue;
        }

        let mut seen_members: HashSet<&str> = HashSet::with_capacity(team.members.len());
        let mut members = Vec::with_capacity(team.members.len());
        for member in &team.members {
            let member_name = member.display_name.trim();
            if member_name.is_empty() {
                warn!(team_name = name, "Skipping member with empty name");
                notes.push(DataQualityNote::EmptyMemberName {
                    team_name: name.to_owned(),
                });
                continue;
            }
            if !seen_members.insert(member_name) {
                warn!(team_name = name, member = member_name, "Skipping repeated member");
                notes.push(DataQualityNote::DuplicateMember {
                    team_name: name.to_owned(),
                    member: member_name.to_owned(),
                });
                continue;
            }
            members.push((member_name, member));
        }

        planned.push(PlannedTeam { name, members });
    }

    planned
}

/// Applies team snapshots with the mark-and-sweep protocol.
pub struct RosterSynchronizer<S> {
    store: S,
}

impl<S: RosterStore> RosterSynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one snapshot for `tournament_id`.
    ///
    /// Everything up to the commit is atomic: an error rolls the whole mark
    /// phase back. The sweep runs afterwards and records per-team delete
    /// failures in the report instead of failing.
    pub async fn sync(
        &self,
        tournament_id: &str,
        teams: &[ExternalTeam],
    ) -> Result<SyncReport, StoreError> {
        let mut report = SyncReport::default();
        let planned = plan_snapshot(teams, &mut report.notes);

        let mut uow = self.store.begin().await?;
        let registrants = uow.list_registrants().await?;
        let index = IdentityIndex::build(&registrants);

        let marked = uow.mark_all_inactive(tournament_id).await?;
        debug!(tournament_id, marked, "Marked teams inactive");

        // local_id -> team that resolved it first in this pass
        let mut assigned: HashMap<i64, &str> = HashMap::new();

        for team in &planned {
            let team_id = uow.upsert_active_team(tournament_id, team.name).await?;

            let mut memberships = Vec::with_capacity(team.members.len());
            for (member_name, member) in &team.members {
                let resolved = index
                    .resolve_member(member_name, member.external_id.as_deref())
                    .and_then(|registrant| {
                        match assigned.get(&registrant.local_id) {
                            Some(kept_by) => {
                                warn!(
                                    team_name = team.name,
                                    member = *member_name,
                                    local_id = registrant.local_id,
                                    kept_by = *kept_by,
                                    "Local account already attached to another team"
                                );
                                report.notes.push(DataQualityNote::LocalIdAlreadyAssigned {
                                    team_name: team.name.to_owned(),
                                    member: (*member_name).to_owned(),
                                    local_id: registrant.local_id,
                                    kept_by: (*kept_by).to_owned(),
                                });
                                None
                            }
                            None => {
                                assigned.insert(registrant.local_id, team.name);
                                Some(registrant.local_id)
                            }
                        }
                    });

                if resolved.is_some() {
                    report.resolved_members += 1;
                }
                memberships.push(NewMembership {
                    member_display_name: (*member_name).to_owned(),
                    resolved_user_id: resolved,
                });
            }

            report.total_members += memberships.len();
            uow.replace_members(team_id, &memberships).await?;
            report.updated_team_count += 1;
        }

        uow.commit().await?;
        info!(
            tournament_id,
            teams = report.updated_team_count,
            members = report.total_members,
            resolved = report.resolved_members,
            "Applied team snapshot"
        );

        self.sweep(tournament_id, &mut report).await?;
        Ok(report)
    }

    async fn sweep(&self, tournament_id: &str, report: &mut SyncReport) -> Result<(), StoreError> {
        let inactive = self.store.list_inactive_teams(tournament_id).await?;
        if inactive.is_empty() {
            return Ok(());
        }
        info!(tournament_id, count = inactive.len(), "Sweeping teams no longer listed");

        for team in inactive {
            match self.store.delete_team(team.team_id).await {
                Ok(_) => {
                    info!(tournament_id, team_id = team.team_id, team_name = %team.team_name, "Removed team");
                    report.removed_teams.push(team.team_name);
                }
                Err(e) => {
                    error!(
                        tournament_id,
                        team_id = team.team_id,
                        team_name = %team.team_name,
                        error = %e,
                        "Failed to remove team"
                    );
                    report.sweep_failures.push(SweepFailure {
                        team_id: team.team_id,
                        team_name: team.team_name,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::registrations::Registrant;
    use crate::roster::memory::MemoryRosterStore;

    fn team(name: &str, members: &[&str]) -> ExternalTeam {
        ExternalTeam::new(
            name,
            members.iter().map(|m| ExternalTeamMember::named(*m)).collect(),
        )
    }

    #[tokio::test]
    async fn test_team_missing_from_snapshot_is_removed() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());

        let first = sync
            .sync("spring-open", &[team("Red", &["Ava"]), team("Blue", &["Bo"])])
            .await
            .unwrap();
        assert_eq!(first.updated_team_count, 2);
        assert!(first.removed_teams.is_empty());

        let second = sync.sync("spring-open", &[team("Blue", &["Bo"])]).await.unwrap();
        assert_eq!(second.updated_team_count, 1);
        assert_eq!(second.removed_teams, vec!["Red".to_string()]);
        assert_eq!(sync.store().team_names("spring-open"), vec!["Blue".to_string()]);
    }

    #[tokio::test]
    async fn test_deleted_team_returns_as_new_row() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());
        sync.sync("spring-open", &[team("Red", &["Ava"]), team("Blue", &["Bo"])])
            .await
            .unwrap();
        let ids = |sync: &RosterSynchronizer<MemoryRosterStore>| -> Vec<(String, i32)> {
            sync.store()
                .snapshot()
                .into_iter()
                .map(|t| (t.team_name, t.team_id))
                .collect()
        };
        assert_eq!(ids(&sync), vec![("Red".to_string(), 1), ("Blue".to_string(), 2)]);

        let dropped = sync.sync("spring-open", &[team("Blue", &["Bo"])]).await.unwrap();
        assert_eq!(dropped.removed_teams, vec!["Red".to_string()]);

        let back = sync
            .sync("spring-open", &[team("Red", &["Ava"]), team("Blue", &["Bo"])])
            .await
            .unwrap();
        assert!(back.removed_teams.is_empty());
        assert_eq!(ids(&sync), vec![("Blue".to_string(), 2), ("Red".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = MemoryRosterStore::with_registrants(vec![Registrant::new(1, "ava", "Ava#100")]);
        let sync = RosterSynchronizer::new(store);
        let snapshot = vec![ExternalTeam::new(
            "Red",
            vec![
                ExternalTeamMember::with_id("Ava", "100"),
                ExternalTeamMember::named("Stranger"),
            ],
        )];

        sync.sync("spring-open", &snapshot).await.unwrap();
        let state = sync.store().snapshot();
        let again = sync.sync("spring-open", &snapshot).await.unwrap();

        assert!(again.removed_teams.is_empty());
        assert_eq!(again.resolved_members, 1);
        assert_eq!(sync.store().snapshot(), state);
    }

    #[tokio::test]
    async fn test_tournaments_do_not_sweep_each_other() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());
        sync.sync("spring-open", &[team("Red", &[])]).await.unwrap();
        let report = sync.sync("summer-cup", &[team("Gold", &[])]).await.unwrap();

        assert!(report.removed_teams.is_empty());
        assert_eq!(sync.store().team_names("spring-open"), vec!["Red".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_in_mark_phase_rolls_back() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());
        sync.sync("spring-open", &[team("Red", &["Ava"])]).await.unwrap();
        let before = sync.store().snapshot();

        sync.store().fail_upsert_of("Blue");
        let result = sync
            .sync("spring-open", &[team("Green", &["Cy"]), team("Blue", &["Bo"])])
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(sync.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_sweep_failure_does_not_block_other_deletions() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());
        sync.sync(
            "spring-open",
            &[team("Red", &[]), team("Blue", &[]), team("Green", &[])],
        )
        .await
        .unwrap();

        sync.store().fail_delete_of("Blue");
        let report = sync.sync("spring-open", &[team("Green", &[])]).await.unwrap();

        assert_eq!(report.removed_teams, vec!["Red".to_string()]);
        assert_eq!(report.sweep_failures.len(), 1);
        assert_eq!(report.sweep_failures[0].team_name, "Blue");
    }

    #[tokio::test]
    async fn test_local_account_attaches_to_first_team_only() {
        let store = MemoryRosterStore::with_registrants(vec![Registrant::new(7, "ava", "Ava")]);
        let sync = RosterSynchronizer::new(store);

        let report = sync
            .sync("spring-open", &[team("Red", &["Ava"]), team("Blue", &["ava"])])
            .await
            .unwrap();

        assert_eq!(report.resolved_members, 1);
        assert_eq!(sync.store().resolved_user("Red", "Ava"), Some(7));
        assert_eq!(sync.store().resolved_user("Blue", "ava"), None);
        assert!(matches!(
            report.notes.as_slice(),
            [DataQualityNote::LocalIdAlreadyAssigned { local_id: 7, .. }]
        ));
    }

    #[tokio::test]
    async fn test_snapshot_hygiene() {
        let sync = RosterSynchronizer::new(MemoryRosterStore::default());
        let report = sync
            .sync(
                "spring-open",
                &[
                    team(" ", &["Ava"]),
                    team("Red", &["Ava", " Ava ", ""]),
                    team("Red ", &["Bo"]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.updated_team_count, 1);
        assert_eq!(report.total_members, 1);
        assert_eq!(report.notes.len(), 4);
        assert_eq!(sync.store().team_names("spring-open"), vec!["Red".to_string()]);
    }
}
