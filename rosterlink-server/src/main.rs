//! Rosterlink Server
//!
//! Keeps a community's registration ledger and team rosters reconciled with
//! an external tournament platform.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use rosterlink_core::config::ConfigStore;
use rosterlink_core::framework::DatabaseProcessor;
use rosterlink_core::processors::{RemovalBatchRunner, SyncCoordinator, SyncScheduler};
use rosterlink_core::roster::PgRosterStore;
use rosterlink_sdk::client::PlatformClient;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Rosterlink - tournament roster reconciliation service
#[derive(Parser, Debug)]
#[command(name = "rosterlink-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./rosterlink-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting rosterlink-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let feed_config = loaded_config.feed.clone();
    let scheduler_config = loaded_config.scheduler_config();
    tracing::info!(
        tournaments = loaded_config.tournaments.len(),
        "Configuration loaded from {:?}",
        args.config
    );

    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Wire the platform client and processors once
    let platform = PlatformClient::new(feed_config.base_url, feed_config.auth_token);
    let coordinator = Arc::new(SyncCoordinator::new(
        platform.clone(),
        PgRosterStore::new(db_pool.clone()),
    ));
    let removals = Arc::new(RemovalBatchRunner::new(
        platform.clone(),
        DatabaseProcessor::new(db_pool.clone()),
        feed_config.removal_pacing,
    ));

    // Spawn the sync scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_config_store = ConfigStore::new(scheduler_config);
    let scheduler_handle = {
        let scheduler = SyncScheduler::new(Arc::clone(&coordinator));
        let watcher = scheduler_config_store.subscribe();
        tokio::spawn(scheduler.run(shutdown_rx, scheduler_config_store.clone(), watcher))
    };

    let state = AppState::new(
        db_pool.clone(),
        shared_config,
        platform,
        coordinator,
        removals,
    );

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify =
        spawn_config_reload_handler(state.clone(), config_loader, scheduler_config_store);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_handle.await {
        tracing::error!("Sync scheduler task failed: {}", e);
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
