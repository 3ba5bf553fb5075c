//! Background random walks feeding the simulated gauges.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::gauges::{BoundedCell, SimulationState, ACTIVE_USERS, QUEUE_SIZE};
use crate::config::{RandomWalkConfig, SimulationConfig};
use crate::utils::random::RandomSource;

type CellOf = fn(&SimulationState) -> &BoundedCell;

/// Handles to the running simulation tasks.
pub struct Simulator {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Simulator {
    /// Starts one task per simulated gauge. Tasks stop when `cancel` fires.
    pub fn spawn(
        state: Arc<SimulationState>,
        config: &SimulationConfig,
        random: Arc<dyn RandomSource>,
        cancel: CancellationToken,
    ) -> Self {
        let walks: [(&'static str, RandomWalkConfig, CellOf); 2] = [
            (ACTIVE_USERS, config.active_users.clone(), |s| &s.active_users),
            (QUEUE_SIZE, config.queue_size.clone(), |s| &s.queue_size),
        ];

        let tasks = walks
            .into_iter()
            .map(|(name, walk, cell_of)| {
                let state = state.clone();
                let random = random.clone();
                let cancel = cancel.clone();
                let handle = tokio::spawn(async move {
                    random_walk(name, cell_of(&state), &walk, random.as_ref(), &cancel).await;
                });
                (name, handle)
            })
            .collect();

        info!("Gauge simulation started");
        Simulator { tasks }
    }

    /// Waits for every task to finish. Call after cancelling the token.
    pub async fn join(self) {
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(gauge = name, "Simulation task ended abnormally: {}", e);
            }
        }
        info!("Gauge simulation stopped");
    }
}

/// Applies one step, then sleeps `interval_ms`, until cancelled.
pub async fn random_walk(
    name: &str,
    cell: &BoundedCell,
    walk: &RandomWalkConfig,
    random: &dyn RandomSource,
    cancel: &CancellationToken,
) {
    let interval = Duration::from_millis(walk.interval_ms);
    loop {
        let delta = random.between(-walk.max_delta, walk.max_delta);
        let value = cell.nudge(delta);
        debug!(gauge = name, delta, value, "Simulation step");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
