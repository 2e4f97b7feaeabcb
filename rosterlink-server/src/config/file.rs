//! TOML file configuration structures.
//!
//! These structs directly map to the `rosterlink-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub tournaments: Vec<TournamentConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Scheduled roster sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

fn default_interval_minutes() -> u64 {
    15
}

/// Registration gating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub signups_open: bool,
}

/// Tournament platform connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub base_url: Url,
    /// Bearer token used for participant kicks. Optional when no removal
    /// batch is ever run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "default_removal_pacing_ms")]
    pub removal_pacing_ms: u64,
}

fn default_removal_pacing_ms() -> u64 {
    500
}

/// A tracked tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub id: String,
    pub shortlink: String,
    pub bounty_id: i64,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[sync]
interval_minutes = 5

[registration]
signups_open = true

[feed]
base_url = "https://platform.example.com"
auth_token = "token"
removal_pacing_ms = 250

[[tournaments]]
id = "spring-open"
shortlink = "spring"
bounty_id = 146289
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.sync.interval_minutes, 5);
        assert!(config.registration.signups_open);
        assert_eq!(config.feed.removal_pacing_ms, 250);
        assert_eq!(config.tournaments.len(), 1);
        assert_eq!(config.tournaments[0].bounty_id, 146289);
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_optional_sections_use_defaults() {
        let toml_str = r#"
[server]

[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[feed]
base_url = "https://platform.example.com"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.sync.interval_minutes, 15);
        assert!(!config.registration.signups_open);
        assert_eq!(config.feed.auth_token, None);
        assert_eq!(config.feed.removal_pacing_ms, 500);
        assert!(config.tournaments.is_empty());
        assert!(config.is_admin_secret_hashed());
    }
}
