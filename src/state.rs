//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the configuration and the metric handles.

use crate::config::Config;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are cheap shared handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<Config>,
    /// Metric handles; every clone mutates the same registry.
    pub metrics: Metrics,
}
