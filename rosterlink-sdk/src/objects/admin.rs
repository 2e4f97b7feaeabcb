//! Admin API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feed::ExternalParticipant;

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// An internal registrant as exposed by the Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantResponse {
    pub local_id: i64,
    pub display_name: String,
    pub claimed_identity: String,
}

/// A participant paired with exactly one registrant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPairResponse {
    pub participant: ExternalParticipant,
    pub registrant: RegistrantResponse,
}

/// A participant whose base name is shared by several registrants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguousMatchResponse {
    pub participant: ExternalParticipant,
    pub candidates: Vec<RegistrantResponse>,
}

/// Category counts of a match report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummaryResponse {
    pub participants: usize,
    pub exact: usize,
    pub name_only: usize,
    pub ambiguous: usize,
    pub unmatched_external: usize,
    pub unmatched_internal: usize,
    /// `exact + name_only`.
    pub total_matched: usize,
}

/// Full categorized result of matching a participant snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReportResponse {
    pub tournament_id: String,
    pub summary: MatchSummaryResponse,
    pub exact: Vec<MatchedPairResponse>,
    pub name_only: Vec<MatchedPairResponse>,
    pub ambiguous: Vec<AmbiguousMatchResponse>,
    pub unmatched_external: Vec<ExternalParticipant>,
    pub unmatched_internal: Vec<RegistrantResponse>,
    /// Human-readable data-quality notes (skipped entries).
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Roster sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    /// The feed returned nothing usable; no team was touched.
    Skipped,
}

/// A team that could not be deleted during the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailureResponse {
    pub team_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub tournament_id: String,
    pub status: SyncStatus,
    pub updated_team_count: usize,
    pub removed_teams: Vec<String>,
    pub sweep_failures: Vec<SweepFailureResponse>,
    pub resolved_members: usize,
    pub total_members: usize,
    pub skipped_reason: Option<String>,
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberResponse {
    pub member_display_name: String,
    pub resolved_user_id: Option<i64>,
    pub resolved_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResponse {
    pub team_id: i32,
    pub tournament_id: String,
    pub team_name: String,
    pub is_active: bool,
    pub last_synced_at: i64,
    pub members: Vec<TeamMemberResponse>,
}

/// Query parameters for listing teams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTeamsQuery {
    pub tournament_id: Option<String>,
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user_id: i64,
    pub username: String,
    /// Self-declared platform identity, formatted `Name#ExternalId`.
    pub claimed_identity: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    AlreadyRegistered,
    SignupsClosed,
    Banned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: RegistrationStatus,
    /// True when an existing registration had its claimed identity replaced.
    pub identity_updated: bool,
}

/// A stored registration, banned placeholders included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub user_id: i64,
    pub username: String,
    pub claimed_identity: Option<String>,
    pub banned: bool,
    /// Unix timestamp (seconds).
    pub registered_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetIdentityRequest {
    pub claimed_identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetIdentityResponse {
    /// False when the user has no registration.
    pub updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedIdentityResponse {
    pub claimed_identity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanStatusResponse {
    pub banned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanResponse {
    /// Whether the user already had a registration before the ban.
    pub was_registered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbanResponse {
    pub unbanned: bool,
}

// ---------------------------------------------------------------------------
// Cleanup and removal batches
// ---------------------------------------------------------------------------

/// Which part of a match report a cleanup acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupCategory {
    /// Registrants nobody on the platform matched.
    UnmatchedInternal,
    /// Registrants whose claimed identity names an unmatched participant.
    UnmatchedExternal,
    /// Every candidate of every ambiguous match.
    Ambiguous,
    /// `UnmatchedInternal` and `Ambiguous` together.
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub category: CleanupCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub category: CleanupCategory,
    pub selected: usize,
    pub unregistered: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalBatchResponse {
    pub batch_id: Uuid,
    pub tournament_id: String,
    pub items: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemovalRunResponse {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items still not succeeded after this run.
    pub remaining: usize,
}
