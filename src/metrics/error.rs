//! Error taxonomy for metric registration and mutation.

use thiserror::Error;

/// Result alias used throughout the metrics core.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors raised by the registry and by metric handles.
///
/// Registration-time variants (`DuplicateName`, `InvalidDescriptor`, `InvalidBuckets`)
/// are meant to abort startup. Mutation-time variants leave the addressed series untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("a metric named '{0}' is already registered")]
    DuplicateName(String),

    #[error("counter '{name}' cannot be incremented by {delta}")]
    InvalidDelta { name: String, delta: f64 },

    #[error("metric '{name}' rejected value {value}")]
    InvalidValue { name: String, value: f64 },

    #[error("label set {got:?} does not match labels {expected:?} of metric '{name}'")]
    UnknownLabelSetShape {
        name: String,
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("invalid metric descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid buckets for histogram '{name}': {reason}")]
    InvalidBuckets { name: String, reason: String },
}
