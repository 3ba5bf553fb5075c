use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Gauge simulation settings: one random walk per simulated gauge.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seeds the random source; unset means an entropy-seeded source per thread.
    pub seed: Option<u64>,
    pub active_users: RandomWalkConfig,
    pub queue_size: RandomWalkConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: None,
            active_users: RandomWalkConfig {
                interval_ms: 5000,
                max_delta: 5,
                min: 0,
                max: 100,
            },
            queue_size: RandomWalkConfig {
                interval_ms: 3000,
                max_delta: 10,
                min: 0,
                max: 500,
            },
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.active_users.validate("simulation.active_users")?;
        self.queue_size.validate("simulation.queue_size")
    }
}

/// A bounded random walk: every `interval_ms`, add a delta drawn uniformly
/// from `[-max_delta, max_delta]` and clamp to `[min, max]`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RandomWalkConfig {
    pub interval_ms: u64,
    pub max_delta: i64,
    pub min: i64,
    pub max: i64,
}

impl RandomWalkConfig {
    fn validate(&self, key: &str) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err(format!("{key}.interval_ms must be greater than zero"));
        }
        if self.max_delta < 0 {
            return Err(format!("{key}.max_delta must not be negative"));
        }
        if self.min > self.max {
            return Err(format!(
                "{key}.min ({}) must not exceed {key}.max ({})",
                self.min, self.max
            ));
        }
        Ok(())
    }
}

/// Artificial request latency and outcome mix for the demo endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct LatencyConfig {
    /// Delay applied by /hello, /random and /data.
    pub processing: LatencyRange,
    /// Delay applied by /slow.
    pub slow: LatencyRange,
    /// Probability that /random answers with a success.
    pub success_probability: f64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        LatencyConfig {
            processing: LatencyRange {
                min_ms: 50,
                max_ms: 200,
            },
            slow: LatencyRange {
                min_ms: 1000,
                max_ms: 3000,
            },
            success_probability: 0.7,
        }
    }
}

impl LatencyConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.processing.validate("latency.processing")?;
        self.slow.validate("latency.slow")?;
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(format!(
                "latency.success_probability must be within [0, 1], got {}",
                self.success_probability
            ));
        }
        Ok(())
    }
}

/// Longest configurable artificial delay: ten minutes.
pub const MAX_LATENCY_MS: u64 = 600_000;

/// Inclusive range of milliseconds to sleep.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct LatencyRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyRange {
    /// A range that never sleeps.
    pub const NONE: LatencyRange = LatencyRange {
        min_ms: 0,
        max_ms: 0,
    };

    fn validate(&self, key: &str) -> Result<(), String> {
        if self.min_ms > self.max_ms {
            return Err(format!(
                "{key}.min_ms ({}) must not exceed {key}.max_ms ({})",
                self.min_ms, self.max_ms
            ));
        }
        if self.max_ms > MAX_LATENCY_MS {
            return Err(format!(
                "{key}.max_ms ({}) must not exceed {MAX_LATENCY_MS}",
                self.max_ms
            ));
        }
        Ok(())
    }
}
