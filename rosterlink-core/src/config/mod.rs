//! Configuration types for rosterlink.
//!
//! These types represent the validated runtime configuration used by the
//! server and the background processors. Loading and parsing the config file
//! is handled by the server crate.

mod admin;
mod config_store;
mod feed;
mod registration;
mod server;
mod sync;
mod tournament;

pub use admin::AdminConfig;
pub use config_store::{ConfigStore, ConfigWatcher};
pub use feed::FeedConfig;
pub use registration::SignupPolicy;
pub use server::ServerConfig;
pub use sync::{DEFAULT_SYNC_INTERVAL, SyncConfig};
pub use tournament::TournamentConfig;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Admin configuration (authentication).
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Registration gating.
    pub registration: Arc<RwLock<SignupPolicy>>,
    /// Tracked tournaments indexed by local id.
    pub tournaments: Arc<RwLock<HashMap<String, TournamentConfig>>>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        admin: AdminConfig,
        registration: SignupPolicy,
        tournaments: HashMap<String, TournamentConfig>,
    ) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            admin: Arc::new(RwLock::new(admin)),
            registration: Arc::new(RwLock::new(registration)),
            tournaments: Arc::new(RwLock::new(tournaments)),
        }
    }

    pub async fn server(&self) -> RwLockReadGuard<'_, ServerConfig> {
        self.server.read().await
    }

    pub async fn admin(&self) -> RwLockReadGuard<'_, AdminConfig> {
        self.admin.read().await
    }

    /// Snapshot of the current signup policy.
    pub async fn signup_policy(&self) -> SignupPolicy {
        *self.registration.read().await
    }

    /// Look up a tracked tournament by its local id.
    pub async fn tournament(&self, id: &str) -> Option<TournamentConfig> {
        self.tournaments.read().await.get(id).cloned()
    }

    pub async fn update_server(&self, config: ServerConfig) {
        let mut server = self.server.write().await;
        *server = config;
    }

    pub async fn update_admin(&self, config: AdminConfig) {
        let mut admin = self.admin.write().await;
        *admin = config;
    }

    pub async fn update_registration(&self, policy: SignupPolicy) {
        let mut registration = self.registration.write().await;
        *registration = policy;
    }

    pub async fn update_tournaments(&self, config: HashMap<String, TournamentConfig>) {
        let mut tournaments = self.tournaments.write().await;
        *tournaments = config;
    }

    /// Update all reloadable sections at once.
    pub async fn update_all(
        &self,
        server: ServerConfig,
        admin: AdminConfig,
        registration: SignupPolicy,
        tournaments: HashMap<String, TournamentConfig>,
    ) {
        // Sequential to avoid holding two write locks at once.
        self.update_server(server).await;
        self.update_admin(admin).await;
        self.update_registration(registration).await;
        self.update_tournaments(tournaments).await;
    }
}
