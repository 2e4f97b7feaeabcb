//! Configuration module for rosterlink-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::{FileConfig, TournamentConfig as FileTournamentConfig};
use rosterlink_core::config::{
    AdminConfig, FeedConfig, ServerConfig, SharedConfig, SignupPolicy, SyncConfig,
    TournamentConfig,
};
use rosterlink_core::processors::SchedulerConfig;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub registration: SignupPolicy,
    pub sync: SyncConfig,
    /// Read once at startup; the platform client is not rebuilt on reload.
    pub feed: FeedConfig,
    pub tournaments: Vec<TournamentConfig>,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        let tournaments = self.tournament_map();
        SharedConfig::new(self.server, self.admin, self.registration, tournaments)
    }

    pub fn tournament_map(&self) -> HashMap<String, TournamentConfig> {
        self.tournaments
            .iter()
            .map(|t| (t.id.clone(), t.clone()))
            .collect()
    }

    /// The part of the configuration the sync scheduler reconciles against.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.sync.interval,
            tournaments: self.tournaments.clone(),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.sync.interval_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "sync.interval_minutes must be greater than zero".to_string(),
        ));
    }
    if config.sync.interval_minutes.checked_mul(60).is_none() {
        return Err(ConfigError::ValidationError(
            "sync.interval_minutes is out of range".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for tournament in &config.tournaments {
        if tournament.id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tournament id must not be empty".to_string(),
            ));
        }
        if tournament.shortlink.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "tournament {} has no shortlink",
                tournament.id
            )));
        }
        if !seen.insert(tournament.id.trim()) {
            return Err(ConfigError::ValidationError(format!(
                "tournament {} is configured twice",
                tournament.id
            )));
        }
    }
    Ok(())
}

pub(crate) fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        registration: SignupPolicy {
            open: file_config.registration.signups_open,
        },
        sync: SyncConfig {
            interval: Duration::from_secs(file_config.sync.interval_minutes.saturating_mul(60)),
        },
        feed: FeedConfig {
            base_url: file_config.feed.base_url,
            auth_token: file_config.feed.auth_token,
            removal_pacing: Duration::from_millis(file_config.feed.removal_pacing_ms),
        },
        tournaments: file_config
            .tournaments
            .into_iter()
            .map(convert_tournament)
            .collect(),
    }
}

fn convert_tournament(t: FileTournamentConfig) -> TournamentConfig {
    TournamentConfig {
        id: t.id.trim().to_owned(),
        shortlink: t.shortlink.trim().to_owned(),
        bounty_id: t.bounty_id,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const BASE: &str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "organizer-secret"

[feed]
base_url = "https://platform.example.com"
"#;

    fn write_temp_config(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rosterlink-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_hashes_plaintext_secret_and_rewrites_file() {
        let content = format!(
            "{BASE}\n[[tournaments]]\nid = \"spring-open\"\nshortlink = \"spring\"\nbounty_id = 7\n"
        );
        let path = write_temp_config(&content);
        let loader = ConfigLoader::new(&path, Some("0.0.0.0:9000".parse().unwrap()));

        let loaded = loader.load().unwrap();
        assert!(loaded.admin.verify_secret("organizer-secret"));
        assert_eq!(loaded.server.listen.port(), 9000);
        assert_eq!(loaded.sync.interval, Duration::from_secs(15 * 60));
        assert_eq!(loaded.registration, SignupPolicy::CLOSED);
        assert_eq!(loaded.feed.removal_pacing, Duration::from_millis(500));
        assert_eq!(loaded.tournaments[0].id, "spring-open");

        let rewritten: FileConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(rewritten.is_admin_secret_hashed());
        assert_eq!(rewritten.tournaments.len(), 1);

        // A second load keeps the stored hash.
        let reloaded = loader.reload().unwrap();
        assert_eq!(reloaded.admin.secret_hash, loaded.admin.secret_hash);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_duplicate_tournament_ids_are_rejected() {
        let content = format!(
            "{BASE}\n[[tournaments]]\nid = \"cup\"\nshortlink = \"a\"\nbounty_id = 1\n\n[[tournaments]]\nid = \"cup\"\nshortlink = \"b\"\nbounty_id = 2\n"
        );
        let config: FileConfig = toml::from_str(&content).unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let content = format!("{BASE}\n[sync]\ninterval_minutes = 0\n");
        let config: FileConfig = toml::from_str(&content).unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_oversized_interval_is_rejected() {
        let content = format!("{BASE}\n[sync]\ninterval_minutes = {}\n", u64::MAX / 2);
        let config: FileConfig = toml::from_str(&content).unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_scheduler_config_mirrors_tournaments() {
        let content = format!(
            "{BASE}\n[sync]\ninterval_minutes = 2\n\n[[tournaments]]\nid = \"cup\"\nshortlink = \"cup\"\nbounty_id = 3\n"
        );
        let config: FileConfig = toml::from_str(&content).unwrap();
        let loaded = build_loaded_config(config, "$argon2id$stub".to_string());

        let scheduler = loaded.scheduler_config();
        assert_eq!(scheduler.interval, Duration::from_secs(120));
        assert_eq!(scheduler.tournaments, loaded.tournaments);
        assert!(loaded.tournament_map().contains_key("cup"));
    }
}
