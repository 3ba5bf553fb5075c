use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Collects event fields as JSON attributes.
#[derive(Default)]
struct AttributeVisitor(Map<String, Value>);

impl AttributeVisitor {
    fn put(&mut self, field: &Field, value: impl Into<Value>) {
        self.0.insert(field.name().to_string(), value.into());
    }
}

impl Visit for AttributeVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}

/// Writes one OTel log-record shaped JSON object per event.
#[derive(Clone)]
struct OtelJsonFormatter {
    resource: Value,
}

impl OtelJsonFormatter {
    fn new(config: &LoggingConfig) -> Self {
        OtelJsonFormatter {
            resource: json!({
                "service.name": config.service_name,
                "service.version": config.service_version,
            }),
        }
    }

    fn severity_number(level: &Level) -> u64 {
        match *level {
            Level::TRACE => 1,
            Level::DEBUG => 5,
            Level::INFO => 9,
            Level::WARN => 13,
            Level::ERROR => 17,
        }
    }

    fn record(&self, event: &Event<'_>) -> Value {
        let metadata = event.metadata();
        let mut visitor = AttributeVisitor::default();
        event.record(&mut visitor);
        let mut attributes = visitor.0;

        let body = match attributes.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => metadata.name().to_string(),
        };
        if let Some(file) = metadata.file() {
            attributes.insert("code.filepath".into(), file.into());
        }
        if let Some(line) = metadata.line() {
            attributes.insert("code.lineno".into(), line.into());
        }
        attributes.insert("code.target".into(), metadata.target().into());

        json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": Self::severity_number(metadata.level()),
            "body": body,
            "resource": self.resource,
            "attributes": attributes,
        })
    }
}

impl<S, N> FormatEvent<S, N> for OtelJsonFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let serialized = serde_json::to_string(&self.record(event)).map_err(|_| std::fmt::Error)?;
        writer.write_str(&serialized)?;
        writer.write_char('\n')
    }
}

/// Parses a `logging.level` value.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            level
        )),
    }
}

/// Installs the global subscriber.
/// `RUST_LOG` directives are layered on top of the configured level.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), String> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter_layer);
    let result = match logging_config.format {
        LogFormat::Json => registry
            .with(fmt::layer().event_format(OtelJsonFormatter::new(logging_config)))
            .try_init(),
        LogFormat::Console => registry.with(fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| format!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels_case_insensitively() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level(" debug ").unwrap(), LevelFilter::DEBUG);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn json_record_has_otel_shape() {
        let config = LoggingConfig {
            level: "info".into(),
            format: LogFormat::Json,
            service_name: "telemetron-test".into(),
            service_version: "9.9.9".into(),
        };
        let formatter = OtelJsonFormatter::new(&config);
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));

        let sink = captured.clone();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            formatter,
            sink,
        });
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(gauge = "app.queue.size", value = 12_i64, "simulation step");
        });

        let record = captured.lock().unwrap().take().expect("event captured");
        assert_eq!(record["body"], "simulation step");
        assert_eq!(record["severity_text"], "INFO");
        assert_eq!(record["severity_number"], 9);
        assert_eq!(record["resource"]["service.name"], "telemetron-test");
        assert_eq!(record["attributes"]["gauge"], "app.queue.size");
        assert_eq!(record["attributes"]["value"], 12);
        assert!(record["attributes"]["code.target"].is_string());
    }

    struct CaptureLayer {
        formatter: OtelJsonFormatter,
        sink: std::sync::Arc<std::sync::Mutex<Option<Value>>>,
    }

    impl<S: Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            *self.sink.lock().unwrap() = Some(self.formatter.record(event));
        }
    }
}
