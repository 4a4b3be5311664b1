//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, server)
//! - Log the loaded routes
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Configuration is loaded by the caller; nothing here reads files
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::http::HttpServer;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::RouteTable;

use super::{signals, Shutdown};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Log every route in table order.
pub fn log_routes(routes: &RouteTable) {
    for (index, compiled) in routes.iter().enumerate() {
        tracing::info!(
            index,
            method = %compiled.route.method,
            url = %compiled.route.url,
            "Route loaded"
        );
    }
    tracing::info!(count = routes.len(), "Route table ready");
}

/// Start everything and serve until SIGINT/SIGTERM.
pub async fn serve(config: ServerConfig, routes: RouteTable) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    log_routes(&routes);

    let server = HttpServer::new(&config, routes);
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    signals::forward_to(shutdown);

    server.run(listener, receiver).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
