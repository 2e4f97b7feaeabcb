//! Background and on-demand processors.
//!
//! - `SyncCoordinator`: runs roster sync passes, one at a time per tournament
//! - `SyncScheduler`: fixed-interval tick loop per tournament, reloadable
//! - `RemovalBatchRunner`: resumable platform kicks with per-item checkpoints

pub mod coordinator;
pub mod removal_batch;
pub mod scheduler;

pub use coordinator::{
    PgSyncCoordinator, SkipReason, SyncCoordinator, SyncError, SyncOutcome, SyncTrigger,
};
pub use removal_batch::{
    CheckpointStore, DEFAULT_REMOVAL_PACING, PgRemovalBatchRunner, RemovalBatchRunner,
    RemovalError, RemovalRunSummary, removal_targets,
};
pub use scheduler::{SchedulerConfig, SyncScheduler};
