//! Team roster synchronisation.
//!
//! The platform only publishes full team snapshots. A pass marks every
//! persisted team of the tournament inactive, re-activates the teams present
//! in the snapshot, rewrites their memberships, commits, and then sweeps the
//! teams left inactive.

#[cfg(test)]
pub(crate) mod memory;
mod pg;
mod store;
mod sync;

pub use pg::{PgRosterStore, PgUnitOfWork};
pub use store::{RosterStore, RosterUnitOfWork, StoreError};
pub use sync::{RosterSynchronizer, SweepFailure, SyncReport};
