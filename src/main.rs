//! Site forms server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                ┌──────────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http::server (sessions, limits, request id)    │
//!                            │        │                                         │
//!                            │        ▼                                         │
//!                            │   http::forms ──▶ security (csrf, rate limit,    │
//!                            │        │           sanitize)                     │
//!                            │        ▼                                         │
//!                            │   forms (validation) ──▶ storage (memory/sqlite) │
//!                            │        │                                         │
//!     303 + flash            │        ▼                                         │
//!     ◀──────────────────────┼── http::flash          observability (tracing,   │
//!                            │                        metrics, security log)    │
//!                            └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use site_forms::config::load_site_config;
use site_forms::lifecycle::signals::forward_signals;
use site_forms::observability::{logging, metrics};
use site_forms::storage::{MemoryRepository, Repository, SqliteRepository};
use site_forms::{AppState, Shutdown, SiteConfig, SiteServer};

#[derive(Debug, Parser)]
#[command(name = "site-forms", version, about = "Website form submission server")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "SITE_CONFIG")]
    config: Option<PathBuf>,

    /// `.env` style file with overrides.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

async fn open_repository(config: &SiteConfig) -> Result<Arc<dyn Repository>, Box<dyn std::error::Error>> {
    match &config.database.url {
        Some(url) => {
            let repository = SqliteRepository::connect(url, 5).await?;
            tracing::info!("Using SQLite repository");
            Ok(Arc::new(repository))
        }
        None if config.database.seed_demo_content => {
            tracing::info!("Using in-memory repository with demo content");
            Ok(Arc::new(MemoryRepository::with_demo_content()))
        }
        None => {
            tracing::warn!("No database configured; submissions are kept in memory only");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_site_config(cli.config.as_deref(), cli.env_file.as_deref())?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("site-forms v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        upload_dir = %config.uploads.directory,
        security_log = %config.observability.security_log_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let repository = open_repository(&config).await?;
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stopped = shutdown.signalled();
    tokio::spawn(forward_signals(shutdown));

    let server = SiteServer::new(AppState::new(config, repository));
    server.run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
