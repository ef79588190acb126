//! UNAIR Satu - login and role-gated admin API

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use config::{Config, LoggingConfig};
use unairsatu_api::{AppState, create_router};
use unairsatu_auth::{AccessPolicy, TokenManager};
use unairsatu_db::Database;

/// UNAIR Satu - login and role-gated admin API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "UNAIRSATU_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "UNAIRSATU_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting UNAIR Satu v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    let admin = bootstrap::ensure_admin(&db, &config.bootstrap).await?;

    let policy = AccessPolicy::new(
        config.access.admin_role_id.unwrap_or(admin.role_id),
        config.access.admin_jenis_user_id.unwrap_or(admin.jenis_user_id),
    );
    info!(
        "Admin routes require role {} and jenis user {}",
        policy.role.map(|r| r.0.to_hex()).unwrap_or_default(),
        policy.jenis_user.map(|j| j.0.to_hex()).unwrap_or_default(),
    );

    let tokens = Arc::new(TokenManager::new(config.auth.token_secret.as_bytes())?);

    let state = AppState::new(db.clone(), tokens, policy);

    let app = create_router(state, Some(Arc::new(metrics_handle))).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
