//! Identity matching between platform participants and local registrants.

mod cleanup;
mod engine;
pub mod identity;
mod index;

pub use cleanup::select_for_cleanup;
pub use engine::{AmbiguousMatch, MatchReport, MatchSummary, MatchedPair, match_participants};
pub use index::IdentityIndex;
