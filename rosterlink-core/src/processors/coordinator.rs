//! SyncCoordinator.
//!
//! Entry point for roster sync passes, both scheduled and on demand:
//! - Serialises passes per tournament through an in-progress guard
//! - Fetches the team snapshot from the feed
//! - Turns an empty or failed fetch into a skipped pass that touches nothing
//! - Hands usable snapshots to the [`RosterSynchronizer`]

use crate::config::TournamentConfig;
use crate::feed::ExternalFeed;
use crate::roster::{PgRosterStore, RosterStore, RosterSynchronizer, StoreError, SyncReport};
use rosterlink_sdk::client::PlatformClient;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    /// A pass for the same tournament is still running.
    #[error("a sync pass for tournament {0:?} is already running")]
    InProgress(String),

    /// The atomic phase failed and was rolled back.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Scheduled,
    OnDemand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The platform listed no teams.
    EmptySnapshot,
    /// The fetch failed; carries the error message.
    FeedUnavailable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptySnapshot => f.write_str("feed returned no teams"),
            SkipReason::FeedUnavailable(e) => write!(f, "feed unavailable: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

/// Releases the tournament's in-progress slot when dropped.
struct PassGuard<'a> {
    running: &'a Mutex<HashSet<String>>,
    tournament_id: String,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        running.remove(&self.tournament_id);
    }
}

pub struct SyncCoordinator<F, S> {
    feed: F,
    synchronizer: RosterSynchronizer<S>,
    running: Mutex<HashSet<String>>,
}

/// The coordinator wired against the platform API and PostgreSQL.
pub type PgSyncCoordinator = SyncCoordinator<PlatformClient, PgRosterStore>;

impl<F: ExternalFeed, S: RosterStore> SyncCoordinator<F, S> {
    pub fn new(feed: F, store: S) -> Self {
        Self {
            feed,
            synchronizer: RosterSynchronizer::new(store),
            running: Mutex::new(HashSet::new()),
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Whether a pass for `tournament_id` is currently running.
    pub fn is_running(&self, tournament_id: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(tournament_id)
    }

    fn try_begin(&self, tournament_id: &str) -> Result<PassGuard<'_>, SyncError> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !running.insert(tournament_id.to_owned()) {
            return Err(SyncError::InProgress(tournament_id.to_owned()));
        }
        Ok(PassGuard {
            running: &self.running,
            tournament_id: tournament_id.to_owned(),
        })
    }

    /// Run one sync pass for `tournament`.
    ///
    /// Rejected with [`SyncError::InProgress`] while another pass for the
    /// same tournament runs. Passes for different tournaments run freely.
    #[tracing::instrument(skip_all, fields(tournament_id = %tournament.id, ?trigger))]
    pub async fn run_pass(
        &self,
        tournament: &TournamentConfig,
        trigger: SyncTrigger,
    ) -> Result<SyncOutcome, SyncError> {
        let _guard = self.try_begin(&tournament.id)?;

        let teams = match self.feed.fetch_teams(tournament).await {
            Ok(teams) => teams,
            Err(e) => {
                warn!(error = %e, "Team fetch failed, skipping pass");
                return Ok(SyncOutcome::Skipped(SkipReason::FeedUnavailable(
                    e.to_string(),
                )));
            }
        };
        if teams.is_empty() {
            warn!("Feed returned no teams, skipping pass");
            return Ok(SyncOutcome::Skipped(SkipReason::EmptySnapshot));
        }

        let report = self.synchronizer.sync(&tournament.id, &teams).await?;
        info!(
            updated = report.updated_team_count,
            removed = report.removed_teams.len(),
            sweep_failures = report.sweep_failures.len(),
            notes = report.notes.len(),
            "Sync pass completed"
        );
        Ok(SyncOutcome::Completed(report))
    }
}
