//! Request duration timer: a prometheus histogram for count/sum plus a lifetime max.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Histogram, HistogramOpts, Opts};
use tokio::time::Instant;

const DURATION_BUCKETS: [f64; 12] = [
    0.025, 0.05, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0,
];

/// Running statistics over every completed sample since startup.
#[derive(Clone)]
pub struct Timer {
    histogram: Histogram,
    max_gauge: Gauge,
    max_nanos: Arc<AtomicU64>,
}

impl Timer {
    pub fn new(name: &str, help: &str, tags: &[(&str, &str)]) -> Result<Self, prometheus::Error> {
        let mut histogram_opts =
            HistogramOpts::new(format!("{name}_seconds"), help).buckets(DURATION_BUCKETS.to_vec());
        let mut max_opts = Opts::new(format!("{name}_seconds_max"), format!("{help} (maximum)"));
        for (key, value) in tags {
            histogram_opts = histogram_opts.const_label(*key, *value);
            max_opts = max_opts.const_label(*key, *value);
        }

        Ok(Timer {
            histogram: Histogram::with_opts(histogram_opts)?,
            max_gauge: Gauge::with_opts(max_opts)?,
            max_nanos: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn record(&self, elapsed: Duration) {
        self.histogram.observe(elapsed.as_secs_f64());
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Times `fut`, recording only when it completes with `Ok`.
    pub async fn time_ok<T, E>(&self, fut: impl Future<Output = Result<T, E>>) -> Result<T, E> {
        let start = Instant::now();
        let result = fut.await;
        if result.is_ok() {
            self.record(start.elapsed());
        }
        result
    }

    pub fn count(&self) -> u64 {
        self.histogram.get_sample_count()
    }

    /// Mean over all samples, zero before the first one.
    pub fn mean(&self) -> Duration {
        match self.count() {
            0 => Duration::ZERO,
            n => Duration::from_secs_f64(self.histogram.get_sample_sum() / n as f64),
        }
    }

    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed))
    }
}

impl Collector for Timer {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.histogram.desc();
        descs.extend(self.max_gauge.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.max_gauge.set(self.max().as_secs_f64());
        let mut families = self.histogram.collect();
        families.extend(self.max_gauge.collect());
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> Timer {
        Timer::new("test_duration", "Test duration", &[("endpoint", "demo")]).unwrap()
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = timer();
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.mean(), Duration::ZERO);
        assert_eq!(timer.max(), Duration::ZERO);
    }

    #[test]
    fn tracks_mean_and_max() {
        let timer = timer();
        timer.record(Duration::from_millis(100));
        timer.record(Duration::from_millis(300));
        timer.record(Duration::from_millis(200));

        assert_eq!(timer.count(), 3);
        let mean_ms = timer.mean().as_secs_f64() * 1000.0;
        assert!((mean_ms - 200.0).abs() < 0.001, "mean was {}", mean_ms);
        assert_eq!(timer.max(), Duration::from_millis(300));
    }

    #[test]
    fn max_gauge_is_exported_with_tags() {
        let timer = timer();
        timer.record(Duration::from_millis(250));
        timer.record(Duration::from_millis(10));

        let families = timer.collect();
        let max = families
            .iter()
            .find(|f| f.get_name() == "test_duration_seconds_max")
            .expect("max family");
        assert_eq!(max.get_metric()[0].get_gauge().get_value(), 0.25);
        let label = &max.get_metric()[0].get_label()[0];
        assert_eq!(label.get_name(), "endpoint");
        assert_eq!(label.get_value(), "demo");
    }

    #[tokio::test]
    async fn time_ok_skips_errors() {
        let timer = timer();
        let ok: Result<u8, ()> = timer.time_ok(async { Ok(1) }).await;
        let err: Result<u8, ()> = timer.time_ok(async { Err(()) }).await;

        assert_eq!(ok, Ok(1));
        assert_eq!(err, Err(()));
        assert_eq!(timer.count(), 1);
    }
}
