//! The instrument registry shared by handlers, the simulator and the scrape endpoint.

use std::sync::Arc;
use std::time::Duration;

use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry, TextEncoder};

use super::gauges::{Gauges, SimulationState};
use super::timer::Timer;

/// Trait for recording request outcomes.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Counts a request as soon as it arrives.
    fn record_request(&self);

    /// Counts a request that ended in a success payload.
    fn record_success(&self);

    /// Counts a request that ended in a (simulated) error payload.
    fn record_error(&self);

    /// Reads the current counts and timer statistics.
    fn snapshot(&self) -> StatsSnapshot;
}

/// Point-in-time view of the request instruments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub mean_response_time: Duration,
    pub max_response_time: Duration,
}

/// Prometheus-backed instrument set. Clones share the same instruments.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    requests_total: IntCounter,
    requests_success: IntCounter,
    requests_error: IntCounter,
    request_duration: Timer,

    gauges: Gauges,
}

impl Metrics {
    /// Creates every instrument once and registers it, gauges reading from `simulation`.
    pub fn new(simulation: Arc<SimulationState>) -> Result<Self, prometheus::Error> {
        Self::with_gauges(Gauges::new(simulation)?)
    }

    /// Like [`Metrics::new`] with a prebuilt gauge set.
    pub fn with_gauges(gauges: Gauges) -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let requests_success = register_int_counter_with_registry!(
            Opts::new("api_requests_success_total", "Total successful API requests")
                .const_label("endpoint", "demo"),
            registry.clone()
        )?;

        let requests_error = register_int_counter_with_registry!(
            Opts::new("api_requests_error_total", "Total failed API requests")
                .const_label("endpoint", "demo"),
            registry.clone()
        )?;

        let requests_total = register_int_counter_with_registry!(
            Opts::new("api_requests_total", "Total API requests"),
            registry.clone()
        )?;

        let request_duration = Timer::new(
            "api_request_duration",
            "API request duration",
            &[("endpoint", "demo")],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        registry.register(Box::new(gauges.clone()))?;

        Ok(Metrics {
            registry,
            requests_total,
            requests_success,
            requests_error,
            request_duration,
            gauges,
        })
    }

    pub fn timer(&self) -> &Timer {
        &self.request_duration
    }

    /// Renders all metrics in Prometheus text format, sampling gauges fresh.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self) {
        self.requests_total.inc();
    }

    fn record_success(&self) {
        self.requests_success.inc();
    }

    fn record_error(&self) {
        self.requests_error.inc();
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.requests_total.get(),
            successful_requests: self.requests_success.get(),
            failed_requests: self.requests_error.get(),
            mean_response_time: self.request_duration.mean(),
            max_response_time: self.request_duration.max(),
        }
    }
}
