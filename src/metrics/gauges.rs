//! Gauges sampled at scrape time.
//!
//! Two gauges read bounded cells owned by the simulator; the memory gauge
//! asks the OS for this process's resident memory on every sample.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Opts};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::config::{RandomWalkConfig, SimulationConfig};

pub const ACTIVE_USERS: &str = "app.active.users";
pub const QUEUE_SIZE: &str = "app.queue.size";
pub const MEMORY_USED_PERCENT: &str = "app.memory.used.percent";

/// An integer that every store keeps within `[min, max]`.
#[derive(Debug)]
pub struct BoundedCell {
    value: AtomicI64,
    min: i64,
    max: i64,
}

impl BoundedCell {
    pub fn new(initial: i64, min: i64, max: i64) -> Self {
        BoundedCell {
            value: AtomicI64::new(initial.clamp(min, max)),
            min,
            max,
        }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Adds `delta` and clamps, as one compare-and-swap. Returns the stored value.
    pub fn nudge(&self, delta: i64) -> i64 {
        let previous = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(self.step(current, delta))
            })
            .unwrap_or_else(|current| current);
        self.step(previous, delta)
    }

    fn step(&self, current: i64, delta: i64) -> i64 {
        current.saturating_add(delta).clamp(self.min, self.max)
    }
}

/// Values mutated by the background random walks.
#[derive(Debug)]
pub struct SimulationState {
    pub active_users: BoundedCell,
    pub queue_size: BoundedCell,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig) -> Self {
        SimulationState {
            active_users: cell_for(&config.active_users),
            queue_size: cell_for(&config.queue_size),
        }
    }
}

/// Walks start at the lower bound, as an idle service would.
fn cell_for(walk: &RandomWalkConfig) -> BoundedCell {
    BoundedCell::new(walk.min, walk.min, walk.max)
}

/// Source of the memory gauge's value, asked once per sample.
pub trait MemorySource: Send + Sync {
    fn used_percent(&self) -> f64;
}

/// Process memory as a percentage of total system memory.
pub struct MemorySampler {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl MemorySampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot resolve own pid, memory gauge will read 0: {}", e);
                None
            }
        };
        MemorySampler {
            system: Mutex::new(System::new()),
            pid,
        }
    }
}

impl MemorySource for MemorySampler {
    /// Refreshes and computes `(used / max) * 100`, clamped to `[0, 100]`.
    fn used_percent(&self) -> f64 {
        let Some(pid) = self.pid else {
            return 0.0;
        };
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let used = system.process(pid).map(|p| p.memory()).unwrap_or(0);
        percent(used, system.total_memory())
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (used as f64 / max as f64 * 100.0).clamp(0.0, 100.0)
}

/// The three scrape-time gauges, registered as one prometheus collector.
#[derive(Clone)]
pub struct Gauges {
    simulation: Arc<SimulationState>,
    memory: Arc<dyn MemorySource>,
    active_users: Gauge,
    queue_size: Gauge,
    memory_used_percent: Gauge,
}

impl Gauges {
    pub fn new(simulation: Arc<SimulationState>) -> Result<Self, prometheus::Error> {
        Self::with_memory(simulation, Arc::new(MemorySampler::new()))
    }

    pub fn with_memory(
        simulation: Arc<SimulationState>,
        memory: Arc<dyn MemorySource>,
    ) -> Result<Self, prometheus::Error> {
        Ok(Gauges {
            simulation,
            memory,
            active_users: Gauge::with_opts(
                Opts::new("app_active_users", "Number of active users")
                    .const_label("type", "business"),
            )?,
            queue_size: Gauge::with_opts(
                Opts::new("app_queue_size", "Current queue size").const_label("type", "technical"),
            )?,
            memory_used_percent: Gauge::with_opts(
                Opts::new("app_memory_used_percent", "Memory usage percentage")
                    .const_label("type", "system"),
            )?,
        })
    }

    /// Samples a gauge by its logical name. Every call reads fresh values.
    pub fn sample(&self, name: &str) -> Option<f64> {
        match name {
            ACTIVE_USERS => Some(self.simulation.active_users.get() as f64),
            QUEUE_SIZE => Some(self.simulation.queue_size.get() as f64),
            MEMORY_USED_PERCENT => Some(self.memory.used_percent()),
            _ => None,
        }
    }

    fn pairs(&self) -> [(&'static str, &Gauge); 3] {
        [
            (ACTIVE_USERS, &self.active_users),
            (QUEUE_SIZE, &self.queue_size),
            (MEMORY_USED_PERCENT, &self.memory_used_percent),
        ]
    }
}

impl Collector for Gauges {
    fn desc(&self) -> Vec<&Desc> {
        self.pairs()
            .into_iter()
            .flat_map(|(_, gauge)| gauge.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.pairs()
            .into_iter()
            .flat_map(|(name, gauge)| {
                if let Some(value) = self.sample(name) {
                    gauge.set(value);
                }
                gauge.collect()
            })
            .collect()
    }
}
