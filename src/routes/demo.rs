//! Demo endpoints generating representative request telemetry.
//!
//! Each handler counts the request, optionally sleeps to simulate work and
//! counts the outcome. All but `/error` are wrapped in the duration timer.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::LatencyRange;
use crate::metrics::MetricsRecorder;
use crate::state::AppState;
use crate::utils::http_helpers::{epoch_millis, HTTPError};

pub const HELLO_MESSAGE: &str = "Hello from the telemetry demo!";
pub const SLOW_MESSAGE: &str = "This was a slow endpoint";
pub const RANDOM_ERROR_MESSAGE: &str = "Random error occurred";
pub const ERROR_MESSAGE: &str = "This endpoint always returns an error";

/// Registers the demo routes (mounted under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route("/random", get(random))
        .route("/slow", get(slow))
        .route("/data", post(data))
        .route("/error", get(error))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RandomResponse {
    Success { value: i64, timestamp: i64 },
    Error { message: &'static str },
}

#[derive(Serialize)]
struct DataResponse {
    received: Value,
    processed: bool,
    timestamp: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    timestamp: String,
}

/// Sleeps for a random duration within `range`, aborting if the server shuts down.
async fn simulate_processing(state: &AppState, range: LatencyRange) -> Result<(), HTTPError> {
    let low = i64::try_from(range.min_ms).unwrap_or(i64::MAX);
    let high = i64::try_from(range.max_ms).unwrap_or(i64::MAX);
    let millis = u64::try_from(state.random.between(low, high)).unwrap_or(0);
    let delay = Duration::from_millis(millis);
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = state.shutdown.cancelled() => {
            debug!("Simulated processing interrupted by shutdown");
            Err(HTTPError::shutting_down())
        }
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

async fn hello(State(state): State<AppState>) -> Result<Json<MessageResponse>, HTTPError> {
    let metrics = &state.metrics;
    metrics
        .timer()
        .time_ok(async {
            metrics.record_request();
            simulate_processing(&state, state.config.latency.processing).await?;
            metrics.record_success();
            Ok::<_, HTTPError>(Json(MessageResponse {
                message: HELLO_MESSAGE,
                timestamp: epoch_millis().to_string(),
            }))
        })
        .await
}

async fn random(State(state): State<AppState>) -> Result<Response, HTTPError> {
    let metrics = &state.metrics;
    metrics
        .timer()
        .time_ok(async {
            metrics.record_request();
            simulate_processing(&state, state.config.latency.processing).await?;

            if state.random.chance(state.config.latency.success_probability) {
                metrics.record_success();
                let body = RandomResponse::Success {
                    value: state.random.between(0, 99),
                    timestamp: epoch_millis(),
                };
                Ok::<_, HTTPError>((StatusCode::OK, Json(body)).into_response())
            } else {
                metrics.record_error();
                debug!("Simulated failure on /random");
                let body = RandomResponse::Error {
                    message: RANDOM_ERROR_MESSAGE,
                };
                Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
            }
        })
        .await
}

async fn slow(State(state): State<AppState>) -> Result<Json<MessageResponse>, HTTPError> {
    let metrics = &state.metrics;
    metrics
        .timer()
        .time_ok(async {
            metrics.record_request();
            simulate_processing(&state, state.config.latency.slow).await?;
            metrics.record_success();
            Ok::<_, HTTPError>(Json(MessageResponse {
                message: SLOW_MESSAGE,
                timestamp: epoch_millis().to_string(),
            }))
        })
        .await
}

async fn data(
    State(state): State<AppState>,
    Json(received): Json<Value>,
) -> Result<Json<DataResponse>, HTTPError> {
    let metrics = &state.metrics;
    metrics
        .timer()
        .time_ok(async {
            metrics.record_request();
            simulate_processing(&state, state.config.latency.processing).await?;
            metrics.record_success();
            Ok::<_, HTTPError>(Json(DataResponse {
                received,
                processed: true,
                timestamp: epoch_millis(),
            }))
        })
        .await
}

/// Always fails with 400; not timed, no delay.
async fn error(State(state): State<AppState>) -> (StatusCode, Json<ErrorResponse>) {
    state.metrics.record_request();
    state.metrics.record_error();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: ERROR_MESSAGE,
            timestamp: epoch_millis().to_string(),
        }),
    )
}
