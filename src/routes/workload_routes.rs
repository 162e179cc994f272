//! Simulated workload endpoints.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{middleware, routing::get, Router};
use rand::Rng;

use crate::metrics::MetricsRecorder;
use crate::middleware::track_http_duration;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers the workload routes, each timed by the duration middleware.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/gauge", get(handle_gauge))
        .route("/bad", get(handle_bad_request))
        .route_layer(middleware::from_fn_with_state(state, track_http_duration))
}

/// Picks a delay in `[0, max_delay_ms)`; zero when delays are disabled.
fn random_delay(max_delay_ms: u64) -> Duration {
    if max_delay_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_delay_ms))
}

/// Sleeps for a random duration, then counts a successful request.
async fn handle_gauge(State(state): State<AppState>) -> Result<StatusCode, HTTPError> {
    let delay = random_delay(state.config.workload.max_delay_ms);
    tokio::time::sleep(delay).await;

    state.metrics.record_gauge_request();
    state
        .metrics
        .record_status(StatusCode::OK.as_u16(), "GET")?;
    Ok(StatusCode::OK)
}

/// Counts a rejected request and answers 400.
async fn handle_bad_request(State(state): State<AppState>) -> Result<StatusCode, HTTPError> {
    state.metrics.record_bad_request();
    state
        .metrics
        .record_status(StatusCode::BAD_REQUEST.as_u16(), "GET")?;
    Ok(StatusCode::BAD_REQUEST)
}
