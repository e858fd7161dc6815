// ABOUTME: Entry point for the logbook binary.
// ABOUTME: Loads .env and CLI overrides, initializes tracing, opens the journal store, and serves HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use logbook_server::{AppState, LogbookConfig, create_router};
use logbook_store::JournalStore;

/// CLI arguments. Each flag overrides the matching LOGBOOK_* variable.
#[derive(Debug, Parser)]
#[command(name = "logbook")]
#[command(about = "Collects systemd journal exports and serves them page by page")]
struct Cli {
    /// SQLite database path.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Socket address to listen on.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// IANA zone used to read request times and format rows.
    #[arg(long)]
    timezone: Option<String>,

    /// Maximum number of database connections.
    #[arg(long)]
    pool_size: Option<usize>,

    /// Seconds to wait for a free database connection.
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Largest accepted journal upload, in bytes.
    #[arg(long)]
    max_body_bytes: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut LogbookConfig) {
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(timezone) = self.timezone {
            config.timezone = timezone;
        }
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = self.max_body_bytes {
            config.max_body_bytes = bytes;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("logbook=info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = LogbookConfig::from_env().context("invalid configuration")?;
    cli.apply(&mut config);
    anyhow::ensure!(config.pool_size >= 1, "pool size must be at least 1");
    anyhow::ensure!(config.max_body_bytes >= 1, "max body bytes must be at least 1");

    tracing::info!(
        db = %config.db_path.display(),
        bind = %config.bind,
        timezone = %config.timezone,
        "logbook starting up"
    );

    let store = JournalStore::open(&config.db_path, config.pool_config(), config.location())
        .with_context(|| format!("failed to open journal store at {}", config.db_path.display()))?;
    let state = Arc::new(AppState::new(store.clone()).with_max_body_bytes(config.max_body_bytes));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close();
    tracing::info!("logbook stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
