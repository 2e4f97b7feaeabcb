//! Application state shared across all request handlers.

use rosterlink_core::config::SharedConfig;
use rosterlink_core::framework::DatabaseProcessor;
use rosterlink_core::processors::{PgRemovalBatchRunner, PgSyncCoordinator};
use rosterlink_sdk::client::PlatformClient;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Participant snapshots for match reports.
    pub feed: PlatformClient,
    /// Shared with the scheduler so that on-demand and scheduled passes
    /// exclude each other.
    pub coordinator: Arc<PgSyncCoordinator>,
    pub removals: Arc<PgRemovalBatchRunner>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: SharedConfig,
        feed: PlatformClient,
        coordinator: Arc<PgSyncCoordinator>,
        removals: Arc<PgRemovalBatchRunner>,
    ) -> Self {
        Self {
            db,
            config,
            feed,
            coordinator,
            removals,
        }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }
}
