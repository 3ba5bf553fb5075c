//! Application startup and server initialization.
//!
//! This module builds the instrument registry, starts the gauge simulation
//! and serves the HTTP routes until a shutdown signal arrives.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConfigV1;
use crate::metrics::Simulator;
use crate::routes;
use crate::state::Components;

/// Initializes and runs the application server.
///
/// Binds to the configured address and serves until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if instruments cannot be registered, the server fails
/// to bind to the specified address or encounters a runtime error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let components = Components::build(config.clone())?;

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;

    tokio::spawn(cancel_on_signal(components.state.shutdown.clone()));

    serve(listener, components).await?;
    Ok(())
}

/// Serves on `listener` until the state's shutdown token is cancelled,
/// then stops the simulation and waits for it.
pub async fn serve(listener: TcpListener, components: Components) -> std::io::Result<()> {
    let Components { state, simulation } = components;
    let shutdown = state.shutdown.clone();

    let simulator = Simulator::spawn(
        simulation,
        &state.config.simulation,
        state.random.clone(),
        shutdown.clone(),
    );

    let app = routes::create_router(state);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    // The server may also stop on an I/O error; the simulation must not outlive it.
    shutdown.cancel();
    simulator.join().await;
    info!("Server stopped");
    result
}

/// Cancels `shutdown` on Ctrl+C or SIGTERM.
pub async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }
    info!("Signal received, starting graceful shutdown");
    shutdown.cancel();
}
