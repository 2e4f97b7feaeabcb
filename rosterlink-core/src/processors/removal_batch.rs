//! RemovalBatchRunner processor.
//!
//! Kicks the participants of a persisted removal batch from the platform:
//! - Loads only the items that have not succeeded yet
//! - Checkpoints every outcome before moving to the next item
//! - Waits a pacing delay between two platform calls
//!
//! A run interrupted halfway (crash, shutdown, platform outage) is resumed by
//! running the same batch again.

use crate::config::TournamentConfig;
use crate::entities::removal_items::{
    GetOutstandingRemovalItems, RecordRemovalOutcome, RemovalItem, RemovalTarget,
};
use crate::feed::ParticipantRemover;
use crate::framework::DatabaseProcessor;
use crate::matching::MatchReport;
use crate::roster::StoreError;
use async_trait::async_trait;
use kanau::processor::Processor;
use rosterlink_sdk::client::PlatformClient;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_REMOVAL_PACING: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum RemovalError {
    /// A run of the same batch is still kicking participants.
    #[error("removal batch {0} is already running")]
    InProgress(Uuid),

    /// A checkpoint could not be read or written; the run stops so that no
    /// outcome goes unrecorded.
    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] StoreError),
}

/// Persistence seam for batch checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn outstanding_items(&self, batch_id: Uuid) -> Result<Vec<RemovalItem>, StoreError>;

    /// Record one attempt; `error` is `None` on success.
    async fn record_outcome(&self, item_id: i64, error: Option<String>) -> Result<(), StoreError>;
}

#[async_trait]
impl CheckpointStore for DatabaseProcessor {
    async fn outstanding_items(&self, batch_id: Uuid) -> Result<Vec<RemovalItem>, StoreError> {
        Ok(self.process(GetOutstandingRemovalItems { batch_id }).await?)
    }

    async fn record_outcome(&self, item_id: i64, error: Option<String>) -> Result<(), StoreError> {
        Ok(self.process(RecordRemovalOutcome { item_id, error }).await?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalRunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items still not succeeded after this run.
    pub remaining: usize,
}

/// Unmatched participants that can be kicked, one per external id.
pub fn removal_targets(report: &MatchReport) -> Vec<RemovalTarget> {
    let mut seen = HashSet::new();
    report
        .unmatched_external
        .iter()
        .filter(|p| !p.external_id.trim().is_empty())
        .filter(|p| seen.insert(p.external_id.trim().to_owned()))
        .map(|p| RemovalTarget {
            external_id: p.external_id.trim().to_owned(),
            display_name: p.display_name.clone(),
        })
        .collect()
}

/// Releases the batch's in-progress slot when dropped.
struct RunGuard<'a> {
    running: &'a Mutex<HashSet<Uuid>>,
    batch_id: Uuid,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        running.remove(&self.batch_id);
    }
}

pub struct RemovalBatchRunner<R, C> {
    remover: R,
    checkpoints: C,
    pacing: Duration,
    running: Mutex<HashSet<Uuid>>,
}

/// The runner wired against the platform API and PostgreSQL.
pub type PgRemovalBatchRunner = RemovalBatchRunner<PlatformClient, DatabaseProcessor>;

impl<R: ParticipantRemover, C: CheckpointStore> RemovalBatchRunner<R, C> {
    pub fn new(remover: R, checkpoints: C, pacing: Duration) -> Self {
        Self {
            remover,
            checkpoints,
            pacing,
            running: Mutex::new(HashSet::new()),
        }
    }

    fn try_begin(&self, batch_id: Uuid) -> Result<RunGuard<'_>, RemovalError> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !running.insert(batch_id) {
            return Err(RemovalError::InProgress(batch_id));
        }
        Ok(RunGuard {
            running: &self.running,
            batch_id,
        })
    }

    /// Run or resume `batch_id` against `tournament`.
    ///
    /// Rejected with [`RemovalError::InProgress`] while another run of the
    /// same batch has not finished, so no participant is kicked twice.
    #[tracing::instrument(skip_all, fields(%batch_id, tournament_id = %tournament.id))]
    pub async fn run(
        &self,
        batch_id: Uuid,
        tournament: &TournamentConfig,
    ) -> Result<RemovalRunSummary, RemovalError> {
        let _guard = self.try_begin(batch_id)?;
        let items = self.checkpoints.outstanding_items(batch_id).await?;
        let mut summary = RemovalRunSummary::default();
        if items.is_empty() {
            info!("Removal batch has nothing outstanding");
            return Ok(summary);
        }
        info!(outstanding = items.len(), "Running removal batch");

        for (i, item) in items.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            summary.attempted += 1;
            let outcome = self
                .remover
                .remove_participant(tournament, &item.external_id)
                .await;
            match outcome {
                Ok(()) => {
                    self.checkpoints.record_outcome(item.id, None).await?;
                    summary.succeeded += 1;
                    info!(external_id = %item.external_id, display_name = %item.display_name, "Removed participant");
                }
                Err(e) => {
                    let message = e.to_string();
                    self.checkpoints
                        .record_outcome(item.id, Some(message.clone()))
                        .await?;
                    summary.failed += 1;
                    warn!(
                        external_id = %item.external_id,
                        display_name = %item.display_name,
                        attempts = item.attempts + 1,
                        error = %message,
                        "Failed to remove participant"
                    );
                }
            }
        }

        summary.remaining = summary.failed;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Removal batch run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::removal_items::RemovalStatus;
    use crate::feed::FeedError;
    use rosterlink_sdk::objects::ExternalParticipant;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryCheckpoints {
        items: Mutex<Vec<RemovalItem>>,
    }

    impl MemoryCheckpoints {
        fn with_targets(batch_id: Uuid, external_ids: &[&str]) -> Self {
            let items = external_ids
                .iter()
                .enumerate()
                .map(|(i, id)| RemovalItem {
                    id: i as i64 + 1,
                    batch_id,
                    tournament_id: "spring-open".to_string(),
                    external_id: id.to_string(),
                    display_name: format!("player-{id}"),
                    status: RemovalStatus::Pending,
                    attempts: 0,
                    last_error: None,
                })
                .collect();
            Self {
                items: Mutex::new(items),
            }
        }

        fn status_of(&self, external_id: &str) -> (RemovalStatus, i32) {
            let items = self.items.lock().unwrap();
            let item = items.iter().find(|i| i.external_id == external_id).unwrap();
            (item.status, item.attempts)
        }
    }

    #[async_trait]
    impl CheckpointStore for MemoryCheckpoints {
        async fn outstanding_items(&self, batch_id: Uuid) -> Result<Vec<RemovalItem>, StoreError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.batch_id == batch_id && i.status != RemovalStatus::Succeeded)
                .cloned()
                .collect())
        }

        async fn record_outcome(
            &self,
            item_id: i64,
            error: Option<String>,
        ) -> Result<(), StoreError> {
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| StoreError::Unavailable("no such item".to_string()))?;
            item.attempts += 1;
            item.status = if error.is_some() {
                RemovalStatus::Failed
            } else {
                RemovalStatus::Succeeded
            };
            item.last_error = error;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlakyRemover {
        failing: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ParticipantRemover for FlakyRemover {
        async fn remove_participant(
            &self,
            _tournament: &TournamentConfig,
            external_id: &str,
        ) -> Result<(), FeedError> {
            self.calls.lock().unwrap().push(external_id.to_string());
            if self.failing.lock().unwrap().contains(external_id) {
                return Err(FeedError::Unavailable { status: 503 });
            }
            Ok(())
        }
    }

    fn tournament() -> TournamentConfig {
        TournamentConfig {
            id: "spring-open".to_string(),
            shortlink: "spring".to_string(),
            bounty_id: 146289,
        }
    }

    #[tokio::test]
    async fn test_restart_retries_only_unfinished_items() {
        let batch_id = Uuid::new_v4();
        let remover = FlakyRemover::default();
        remover.failing.lock().unwrap().insert("200".to_string());
        let runner = RemovalBatchRunner::new(
            remover,
            MemoryCheckpoints::with_targets(batch_id, &["100", "200", "300"]),
            Duration::ZERO,
        );

        let first = runner.run(batch_id, &tournament()).await.unwrap();
        assert_eq!(
            first,
            RemovalRunSummary {
                attempted: 3,
                succeeded: 2,
                failed: 1,
                remaining: 1
            }
        );
        assert_eq!(runner.checkpoints.status_of("200"), (RemovalStatus::Failed, 1));

        runner.remover.failing.lock().unwrap().clear();
        runner.remover.calls.lock().unwrap().clear();
        let second = runner.run(batch_id, &tournament()).await.unwrap();

        assert_eq!(second.attempted, 1);
        assert_eq!(second.remaining, 0);
        assert_eq!(*runner.remover.calls.lock().unwrap(), vec!["200".to_string()]);
        assert_eq!(runner.checkpoints.status_of("200"), (RemovalStatus::Succeeded, 2));

        let third = runner.run(batch_id, &tournament()).await.unwrap();
        assert_eq!(third, RemovalRunSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_runs_kick_each_participant_once() {
        let batch_id = Uuid::new_v4();
        let runner = RemovalBatchRunner::new(
            FlakyRemover::default(),
            MemoryCheckpoints::with_targets(batch_id, &["1", "2", "3"]),
            DEFAULT_REMOVAL_PACING,
        );

        let t = tournament();
        let (first, second) = tokio::join!(runner.run(batch_id, &t), runner.run(batch_id, &t));
        let results = [first, second];

        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(RemovalError::InProgress(id)) if *id == batch_id))
            .count();
        assert_eq!(rejected, 1);
        let finished = results.iter().find_map(|r| r.as_ref().ok()).unwrap();
        assert_eq!(finished.succeeded, 3);
        assert_eq!(
            *runner.remover.calls.lock().unwrap(),
            vec!["1".to_string(), "2".to_string(), "3".to_string()]
        );
        assert_eq!(runner.checkpoints.status_of("2"), (RemovalStatus::Succeeded, 1));

        // The slot is released once the run finishes.
        let again = runner.run(batch_id, &t).await.unwrap();
        assert_eq!(again, RemovalRunSummary::default());
    }

    #[tokio::test]
    async fn test_other_batches_run_concurrently() {
        let first_batch = Uuid::new_v4();
        let runner = RemovalBatchRunner::new(
            FlakyRemover::default(),
            MemoryCheckpoints::with_targets(first_batch, &["1"]),
            Duration::ZERO,
        );

        let _held = runner.try_begin(first_batch).unwrap();
        let other = runner.run(Uuid::new_v4(), &tournament()).await.unwrap();
        assert_eq!(other, RemovalRunSummary::default());
        assert!(matches!(
            runner.run(first_batch, &tournament()).await,
            Err(RemovalError::InProgress(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_paced() {
        let batch_id = Uuid::new_v4();
        let runner = RemovalBatchRunner::new(
            FlakyRemover::default(),
            MemoryCheckpoints::with_targets(batch_id, &["1", "2", "3"]),
            DEFAULT_REMOVAL_PACING,
        );

        let started = tokio::time::Instant::now();
        runner.run(batch_id, &tournament()).await.unwrap();
        assert_eq!(started.elapsed(), DEFAULT_REMOVAL_PACING * 2);
    }

    #[test]
    fn test_targets_skip_missing_and_repeated_ids() {
        let report = MatchReport {
            unmatched_external: vec![
                ExternalParticipant::new("Ava", "100", ""),
                ExternalParticipant::new("NoId", " ", ""),
                ExternalParticipant::new("Ava again", "100", ""),
            ],
            ..MatchReport::default()
        };
        assert_eq!(
            removal_targets(&report),
            vec![RemovalTarget {
                external_id: "100".to_string(),
                display_name: "Ava".to_string()
            }]
        );
    }
}
