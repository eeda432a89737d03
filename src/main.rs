use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use coop_brick_breaker::config::ServerConfig;
use coop_brick_breaker::lobby::manager::LobbyManager;
use coop_brick_breaker::metrics::{self, Metrics};
use coop_brick_breaker::net::transport::RelayServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Brick Breaker relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    config.validate().context("Invalid relay configuration")?;
    info!(
        "Configuration loaded: port={}, max_rooms={}, max_message_size={}",
        config.port, config.max_rooms, config.max_message_size
    );

    let metrics = Arc::new(Metrics::new());

    let metrics_clone = metrics.clone();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(metrics_clone, metrics_port).await {
            error!("Metrics server error: {}", e);
        }
    });

    let lobby_manager = Arc::new(RwLock::new(LobbyManager::with_metrics(
        config.max_rooms,
        metrics.clone(),
    )));

    let server = RelayServer::new(config.clone(), lobby_manager.clone(), metrics.clone()).await?;

    info!("Relay ready on https://localhost:{}", config.port);
    info!(
        "Chrome flag: --ignore-certificate-errors-spki-list={}",
        server.cert_hash()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Relay error: {}", e);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    lobby_manager.write().await.shutdown();
    info!("Relay stopped");

    Ok(())
}
