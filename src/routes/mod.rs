//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints into logical groups:
//! metrics exposition, simulated workload, and health checks.

mod health_routes;
mod metrics_routes;
mod workload_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router and attaches
/// the application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes::routes())
        .merge(workload_routes::routes(state.clone()))
        .merge(health_routes::routes())
        .with_state(state)
}
