//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! configuration, the instrument registry, the random source and the
//! shutdown signal.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ConfigV1;
use crate::metrics::{Metrics, SimulationState};
use crate::utils::random::{RandomSource, SeededRandom, ThreadRandom};

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Request counters, duration timer and gauges.
    pub metrics: Metrics,
    /// Source of simulated latency and outcomes.
    pub random: Arc<dyn RandomSource>,
    /// Fires when the process is shutting down.
    pub shutdown: CancellationToken,
}

/// Everything built once at startup from the configuration.
pub struct Components {
    pub state: AppState,
    pub simulation: Arc<SimulationState>,
}

impl Components {
    /// Registers the instruments and picks the random source for `config`.
    pub fn build(config: Arc<ConfigV1>) -> Result<Self, prometheus::Error> {
        let random: Arc<dyn RandomSource> = match config.simulation.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Self::with_random(config, random)
    }

    /// Like [`Components::build`] with an explicit random source.
    pub fn with_random(
        config: Arc<ConfigV1>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, prometheus::Error> {
        let simulation = Arc::new(SimulationState::new(&config.simulation));
        let metrics = Metrics::new(simulation.clone())?;
        Ok(Components {
            state: AppState {
                config,
                metrics,
                random,
                shutdown: CancellationToken::new(),
            },
            simulation,
        })
    }
}
