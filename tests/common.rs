#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::Value;
use telemetron::config::{extract_config, ConfigV1, LatencyRange};
use telemetron::routes::create_router;
use telemetron::state::{AppState, Components};
use telemetron::utils::random::{RandomSource, ThreadRandom};

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
logging:
  level: "debug"
  format: "json"
latency:
  processing:
    min_ms: 0
    max_ms: 0
  slow:
    min_ms: 0
    max_ms: 0
  success_probability: 0.7
"#;

pub fn load_test_config() -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("Failed to parse test config YAML")
}

/// Test config with custom latency ranges.
pub fn config_with_latency(processing: LatencyRange, slow: LatencyRange) -> ConfigV1 {
    let mut config = load_test_config();
    config.latency.processing = processing;
    config.latency.slow = slow;
    config
}

pub fn build_app(config: ConfigV1) -> (Router, AppState) {
    build_app_with_random(config, Arc::new(ThreadRandom))
}

pub fn build_app_with_random(
    config: ConfigV1,
    random: Arc<dyn RandomSource>,
) -> (Router, AppState) {
    let components =
        Components::with_random(Arc::new(config), random).expect("instruments register");
    let state = components.state;
    (create_router(state.clone()), state)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, json)
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Replays scripted draws. Degenerate ranges return `low` without consuming
/// a value; an exhausted script falls back to `low` and `0.0`.
#[derive(Default)]
pub struct ScriptedRandom {
    integers: Mutex<VecDeque<i64>>,
    units: Mutex<VecDeque<f64>>,
}

impl ScriptedRandom {
    pub fn new(integers: &[i64], units: &[f64]) -> Self {
        ScriptedRandom {
            integers: Mutex::new(integers.iter().copied().collect()),
            units: Mutex::new(units.iter().copied().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let next = self.integers.lock().unwrap().pop_front().unwrap_or(low);
        assert!(
            (low..=high).contains(&next),
            "scripted value {} outside [{}, {}]",
            next,
            low,
            high
        );
        next
    }

    fn unit(&self) -> f64 {
        self.units.lock().unwrap().pop_front().unwrap_or(0.0)
    }
}
