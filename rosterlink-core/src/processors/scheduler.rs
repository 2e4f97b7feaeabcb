//! SyncScheduler processor.
//!
//! The SyncScheduler is responsible for:
//! - Running one fixed-interval tick loop per configured tournament
//! - Triggering a scheduled sync pass through the [`SyncCoordinator`] on
//!   every tick
//! - Reacting to config changes by diffing the tournament set (spawning or
//!   aborting only the loops that actually changed)

use super::coordinator::{SyncCoordinator, SyncError, SyncOutcome, SyncTrigger};
use crate::config::{ConfigStore, ConfigWatcher, TournamentConfig};
use crate::feed::ExternalFeed;
use crate::roster::RosterStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Configuration for the SyncScheduler, held in a [`ConfigStore`] so that
/// it can be swapped on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub tournaments: Vec<TournamentConfig>,
}

pub struct SyncScheduler<F, S> {
    coordinator: Arc<SyncCoordinator<F, S>>,
}

/// A running tick loop and the settings it was spawned with.
struct ActiveLoop {
    tournament: TournamentConfig,
    interval: Duration,
    handle: JoinHandle<()>,
}

impl<F, S> SyncScheduler<F, S>
where
    F: ExternalFeed + 'static,
    S: RosterStore + 'static,
{
    pub fn new(coordinator: Arc<SyncCoordinator<F, S>>) -> Self {
        Self { coordinator }
    }

    /// Run until shutdown is signaled.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        config_store: ConfigStore<SchedulerConfig>,
        mut config_watcher: ConfigWatcher,
    ) {
        let mut active: Vec<ActiveLoop> = Vec::new();
        {
            let config = config_store.read().await;
            self.apply_diff(&mut active, &config);
            info!(
                tournaments = active.len(),
                interval_secs = config.interval.as_secs(),
                "SyncScheduler started"
            );
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("SyncScheduler received shutdown signal");
                        break;
                    }
                }

                changed = config_watcher.changed() => {
                    if changed.is_err() {
                        warn!("Scheduler config store dropped");
                        break;
                    }
                    let config = config_store.read().await;
                    self.apply_diff(&mut active, &config);
                    info!(tournaments = active.len(), "SyncScheduler reconciled config");
                }
            }
        }

        for tick_loop in active {
            tick_loop.handle.abort();
        }
        info!("SyncScheduler shutdown complete");
    }

    /// Abort loops whose tournament vanished or changed, spawn loops for the
    /// new ones. Unchanged loops keep their timers.
    fn apply_diff(&self, active: &mut Vec<ActiveLoop>, config: &SchedulerConfig) {
        active.retain(|tick_loop| {
            let keep = tick_loop.interval == config.interval
                && config.tournaments.contains(&tick_loop.tournament);
            if !keep {
                info!(tournament_id = %tick_loop.tournament.id, "Aborting sync loop");
                tick_loop.handle.abort();
            }
            keep
        });

        for tournament in &config.tournaments {
            if !active.iter().any(|l| &l.tournament == tournament) {
                info!(tournament_id = %tournament.id, "Spawning sync loop");
                let handle = self.spawn_tick_loop(tournament.clone(), config.interval);
                active.push(ActiveLoop {
                    tournament: tournament.clone(),
                    interval: config.interval,
                    handle,
                });
            }
        }
    }

    /// The first tick fires immediately, so a newly configured tournament is
    /// synced right away.
    fn spawn_tick_loop(&self, tournament: TournamentConfig, interval: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match coordinator.run_pass(&tournament, SyncTrigger::Scheduled).await {
                    Ok(SyncOutcome::Completed(report)) => debug!(
                        tournament_id = %tournament.id,
                        removed = report.removed_teams.len(),
                        "Scheduled sync finished"
                    ),
                    Ok(SyncOutcome::Skipped(reason)) => {
                        debug!(tournament_id = %tournament.id, %reason, "Scheduled sync skipped")
                    }
                    Err(SyncError::InProgress(_)) => {
                        debug!(tournament_id = %tournament.id, "Sync already running, skipping tick")
                    }
                    Err(e) => {
                        error!(tournament_id = %tournament.id, error = %e, "Scheduled sync failed")
                    }
                }
            }
        })
    }
}
