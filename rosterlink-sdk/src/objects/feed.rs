//! Point-in-time snapshot types produced by the tournament platform feed.
//!
//! Nothing here is persisted. Every fetch re-derives these values and the
//! reconciliation engine treats them as untrusted input.

use serde::{Deserialize, Serialize};

/// A single participant as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalParticipant {
    pub display_name: String,
    /// Platform account id. Opaque and only meaningful next to the display name.
    pub external_id: String,
    /// In-game handle the participant entered on the platform, if any.
    #[serde(default)]
    pub secondary_handle: String,
}

impl ExternalParticipant {
    pub fn new(
        display_name: impl Into<String>,
        external_id: impl Into<String>,
        secondary_handle: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            external_id: external_id.into(),
            secondary_handle: secondary_handle.into(),
        }
    }
}

/// A member of a team snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalTeamMember {
    pub display_name: String,
    /// Present when the platform exposes the member's account id.
    #[serde(default)]
    pub external_id: Option<String>,
}

impl ExternalTeamMember {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            external_id: None,
        }
    }

    pub fn with_id(display_name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            external_id: Some(external_id.into()),
        }
    }
}

/// A team as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTeam {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<ExternalTeamMember>,
}

impl ExternalTeam {
    pub fn new(team_name: impl Into<String>, members: Vec<ExternalTeamMember>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
        }
    }
}
