//! Metrics collection and exposition for Prometheus.
//!
//! This module owns the request counters and timer, the scrape-time gauges
//! and the background tasks that simulate gauge activity.

pub mod gauges;
mod recorder;
pub mod simulator;
pub mod timer;

pub use gauges::{Gauges, MemorySource, MemorySampler, SimulationState};
pub use recorder::{Metrics, MetricsRecorder, StatsSnapshot};
pub use simulator::Simulator;
pub use timer::Timer;
