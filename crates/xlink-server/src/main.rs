//! ============================================================================
//! xlink-server binary
//! ============================================================================
//! Loads `.env`, validates configuration and serves the linking routes.
//! Missing credentials abort startup instead of surfacing on first request.
//! ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xlink_core::LinkConfig;
use xlink_server::{create_router, AppState};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "xlink-server")]
#[command(about = "Link X accounts over OAuth 1.0a")]
struct Cli {
    /// Listen address, overrides BIND_ADDRESS
    #[arg(long)]
    bind: Option<String>,

    /// Load environment from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let Err(e) = loaded {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("xlink_server=debug".parse()?)
                .add_directive("xlink_core=debug".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Starting xlink-server v{}", env!("CARGO_PKG_VERSION"));

    let config = LinkConfig::from_env()
        .and_then(|config| config.validate().map(|_| config))
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;
    info!(
        "Callback URL: {} (correlation: {:?}, pending TTL: {}s)",
        config.callback_url, config.correlation_mode, config.pending_ttl_secs
    );

    let state = Arc::new(AppState::new(config)?);
    let app = create_router(state);

    let bind = cli
        .bind
        .or_else(|| std::env::var("BIND_ADDRESS").ok())
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Graceful shutdown initiated");
}
