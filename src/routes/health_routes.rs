//! Liveness endpoint.

use crate::state::AppState;
use axum::{routing::get, Router};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Answers `OK` whenever the server is accepting requests. The registry is built
/// before the listener binds, so a live server can always be scraped.
async fn health_check() -> &'static str {
    "OK"
}
