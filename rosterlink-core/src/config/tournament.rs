//! Tournament configuration.

/// A tournament tracked on the external platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TournamentConfig {
    /// Local identifier, used in admin routes and to scope persisted teams.
    pub id: String,
    /// Shortlink the platform resolves to the bounty (team listing).
    pub shortlink: String,
    /// Numeric bounty id (participant listing and kicks).
    pub bounty_id: i64,
}
