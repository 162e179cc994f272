//! Application startup and server initialization.
//!
//! This module builds the metric registry, starts the background generators
//! and serves the HTTP routes until a shutdown signal arrives.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::generators::Generators;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Registers every metric, spawns the generators, binds to the configured
/// listen address and serves requests until Ctrl-C / SIGTERM.
///
/// # Errors
///
/// Returns an error if metric registration fails, if the server cannot bind to
/// the configured address, or if serving fails.
pub async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new()?;
    let generators = Generators::spawn(metrics.clone(), &config.generators);

    let state = AppState {
        config: config.clone(),
        metrics,
    };
    let app = routes::create_router(state);

    let listener = match TcpListener::bind(&config.listen_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Could not bind to {}: {}", config.listen_address, e);
            generators.shutdown().await;
            return Err(e.into());
        }
    };
    info!("Starting server on {}", listener.local_addr()?);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    generators.shutdown().await;
    served?;
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received.");
}
