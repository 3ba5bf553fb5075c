use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::simulation::{LatencyConfig, SimulationConfig};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "TELEMETRON_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
const ENV_PREFIX: &str = "TELEMETRON_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: listener, logging, gauge simulation and request latency.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
}

impl ConfigV1 {
    /// Checks the value ranges serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        self.simulation.validate()?;
        self.latency.validate()
    }
}

impl TryFrom<Config> for ConfigV1 {
    type Error = figment::Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        // handle configuration migration between versions here when necessary
        let config = match config {
            Config::ConfigV1(c) => c,
        };
        config.validate().map_err(figment::Error::from)?;
        Ok(config)
    }
}

/// Builds the figment for a config file, with `TELEMETRON_*` overrides on top.
pub fn figment_for(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
}

/// Load config from the YAML file named by `TELEMETRON_CONFIG`,
/// falling back to "config.yaml" in the current directory.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    extract_config(figment_for(&path))
}

/// Extracts and validates a versioned config from any figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, figment::Error> {
    figment.extract::<Config>()?.try_into()
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    fn parse(yaml: &str) -> Result<ConfigV1, figment::Error> {
        extract_config(Figment::new().merge(Yaml::string(yaml)))
    }

    #[test]
    fn minimal_config_uses_simulation_defaults() {
        let config = parse(
            r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: json
"#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.simulation.active_users.interval_ms, 5000);
        assert_eq!(config.simulation.active_users.max_delta, 5);
        assert_eq!(config.simulation.active_users.max, 100);
        assert_eq!(config.simulation.queue_size.interval_ms, 3000);
        assert_eq!(config.simulation.queue_size.max_delta, 10);
        assert_eq!(config.simulation.queue_size.max, 500);
        assert_eq!(config.latency.processing.min_ms, 50);
        assert_eq!(config.latency.processing.max_ms, 200);
        assert_eq!(config.latency.slow.min_ms, 1000);
        assert_eq!(config.latency.slow.max_ms, 3000);
        assert!((config.latency.success_probability - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.simulation.seed, None);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = parse(
            r#"
version: "2.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: console
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn inverted_latency_range_is_rejected() {
        let result = parse(
            r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: console
latency:
  processing:
    min_ms: 300
    max_ms: 100
"#,
        );
        let err = result.expect_err("inverted range must fail validation");
        assert!(err.to_string().contains("processing"), "got: {}", err);
    }

    #[test]
    fn oversized_latency_is_rejected() {
        let result = parse(
            r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: console
latency:
  slow:
    min_ms: 0
    max_ms: 18446744073709551615
"#,
        );
        let err = result.expect_err("latency beyond the cap must fail validation");
        assert!(err.to_string().contains("latency.slow.max_ms"), "got: {}", err);
    }

    #[test]
    fn success_probability_out_of_range_is_rejected() {
        let result = parse(
            r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: console
latency:
  success_probability: 1.5
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: info
  format: console
"#,
            )?;
            jail.set_env("TELEMETRON_BIND_ADDRESS", "127.0.0.1:9999");
            jail.set_env("TELEMETRON_SIMULATION__SEED", "42");

            let config = extract_config(figment_for("config.yaml"))?;
            assert_eq!(config.bind_address, "127.0.0.1:9999");
            assert_eq!(config.simulation.seed, Some(42));
            assert_eq!(config.simulation.queue_size.max, 500);
            Ok(())
        });
    }
}
