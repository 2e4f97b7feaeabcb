//! External platform connection settings.

use url::Url;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// API root of the tournament platform.
    pub base_url: Url,
    /// Bearer token for write calls (participant kicks). Reads are anonymous.
    pub auth_token: Option<String>,
    /// Delay between two kick calls of a removal batch.
    pub removal_pacing: std::time::Duration,
}
