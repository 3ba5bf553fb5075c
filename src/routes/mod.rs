//! HTTP route definitions and handlers.
//!
//! The demo endpoints and the stats summary live under `/api`; the scrape
//! endpoint and health check sit at the root.

mod demo;
mod health_routes;
mod metrics;
mod stats;

pub use demo::{ERROR_MESSAGE, HELLO_MESSAGE, RANDOM_ERROR_MESSAGE, SLOW_MESSAGE};
pub use stats::StatsResponse;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new().merge(demo::routes()).merge(stats::routes());

    Router::new()
        .nest("/api", api)
        .merge(metrics::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
