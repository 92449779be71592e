//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration (fatal on error)
//! - Initialize logging and metrics
//! - Start the config watcher when running from a file
//! - Bind the listener last, then serve until shutdown

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_config, ConfigWatcher, GatewayConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Load the configuration at `path`, or the defaults when no path is given.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(GatewayConfig::default()),
    }
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn start(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config_path)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "redirect-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        site_url = %config.site.url,
        admin_url = ?config.site.admin.url,
        upstream = %config.upstream.address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
