//! Metrics exposition endpoint.

use crate::metrics::TextEncoder;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Returns every registered metric in the text exposition format. The whole
/// registry is rendered on each call.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry().gather();
    let metrics_text = encoder.encode_to_string(&families);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.content_type())],
        metrics_text,
    )
}
