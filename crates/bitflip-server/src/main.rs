//! Bitflip server binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitflip_server::{AppState, ServerConfig, create_router};

/// REST server for the 3-qubit bit-flip code
#[derive(Parser, Debug)]
#[command(name = "bitflip-server", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "BITFLIP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitflip_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    let addr = config.socket_addr()?;
    tracing::debug!(?config, "Configuration loaded");

    let state = Arc::new(AppState::new(config).context("opening upload directory")?);
    tracing::info!(
        upload_dir = %state.blobs.root().display(),
        "Blob store ready"
    );

    let app = create_router(state);

    tracing::info!("Starting bitflip server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
