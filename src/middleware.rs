//! Request-duration tracking for the workload endpoints.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::metrics::MetricsRecorder;
use crate::state::AppState;

/// Times the wrapped handler into `simple_app_http_request_duration_seconds{path}`.
///
/// The `path` label is the request path without surrounding slashes, so `/gauge`
/// is recorded as `gauge`.
pub async fn track_http_duration(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().trim_matches('/').to_string();
    let timer = match state.metrics.start_http_timer(&path) {
        Ok(timer) => Some(timer),
        Err(e) => {
            warn!(error = %e, path = %path, "not timing request");
            None
        }
    };

    let response = next.run(request).await;

    if let Some(timer) = timer {
        timer.observe_duration();
    }
    response
}
