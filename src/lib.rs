//! Library exports for simple-app, shared between the binary and tests.

pub mod config;
pub mod generators;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
