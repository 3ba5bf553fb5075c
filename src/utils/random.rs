//! Injectable randomness for simulated latency, outcomes and gauge walks.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random numbers shared by handlers and the simulator.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in the inclusive range `[low, high]`. Returns `low` if `high <= low`.
    fn between(&self, low: i64, high: i64) -> i64;

    /// Uniform float in `[0, 1)`.
    fn unit(&self) -> f64;

    /// True with probability `p`.
    fn chance(&self, p: f64) -> bool {
        self.unit() < p
    }
}

/// Entropy-seeded source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }

    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source for a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.with_rng(|rng| rng.gen_range(low..=high))
    }

    fn unit(&self) -> f64 {
        self.with_rng(|rng| rng.gen::<f64>())
    }
}
