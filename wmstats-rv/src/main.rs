//! wmstats-rv (Request View) - request status table service
//!
//! Reads request documents from the WMStats CouchDB views and serves the
//! merged per-request status table.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wmstats_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use wmstats_rv::couch::CouchClient;
use wmstats_rv::fetch::{FetchOrchestrator, ViewNames};
use wmstats_rv::{build_router, AppState};

/// Command-line arguments for wmstats-rv
#[derive(Parser, Debug)]
#[command(name = "wmstats-rv")]
#[command(about = "Request status view for WMStats")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CouchDB server URL (overrides the config file)
    #[arg(long, env = "WMSTATS_COUCH_URL")]
    couch_url: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "WMSTATS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(url) = args.couch_url {
        config.couch_url = url;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting WMStats Request View (wmstats-rv) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        _ => info!("Configuration: built-in defaults"),
    }
    info!(
        "Document store: {}/{} (design {})",
        config.couch_url, config.database, config.design
    );

    let client = CouchClient::from_config(&config).context("Failed to create view client")?;
    let orchestrator = FetchOrchestrator::new(Arc::new(client), ViewNames::from(&config));

    let state = AppState::new(orchestrator);
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("wmstats-rv listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
