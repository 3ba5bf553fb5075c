//! Read-only summary of the request instruments.

use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricsRecorder, StatsSnapshot};
use crate::state::AppState;

/// Registers the stats route (mounted under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics/stats", get(stats))
}

/// Body of `GET /api/metrics/stats`; durations are rendered like `"123.456ms"`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: String,
    pub max_response_time: String,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(snapshot: StatsSnapshot) -> Self {
        StatsResponse {
            total_requests: snapshot.total_requests,
            successful_requests: snapshot.successful_requests,
            failed_requests: snapshot.failed_requests,
            average_response_time: format_millis(snapshot.mean_response_time),
            max_response_time: format_millis(snapshot.max_response_time),
        }
    }
}

fn format_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_nanos() as f64 / 1_000_000.0)
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.metrics.snapshot().into())
}
