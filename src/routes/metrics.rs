//! Metrics exposition endpoint.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Router};

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Returns all instruments in Prometheus text format. Gauges are sampled
/// while rendering, so every scrape sees current values.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let metrics_text = state.metrics.render().map_err(|e| {
        tracing::error!("Failed to encode metrics: {}", e);
        HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics_text,
    ))
}
