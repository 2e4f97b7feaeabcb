pub mod admin;
pub mod feed;

pub use feed::{ExternalParticipant, ExternalTeam, ExternalTeamMember};
