use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use simple_app::config::{Config, GeneratorsConfig, WorkloadConfig};
use simple_app::metrics::Metrics;
use simple_app::routes::create_router;
use simple_app::state::AppState;

/// Configuration with no artificial delays and no background generators,
/// so metric values are fully determined by the requests a test makes.
pub fn test_config() -> Config {
    Config {
        listen_address: "127.0.0.1:0".to_string(),
        generators: GeneratorsConfig {
            enabled: false,
            ..GeneratorsConfig::default()
        },
        workload: WorkloadConfig { max_delay_ms: 0 },
        ..Config::default()
    }
}

pub fn build_app(config: Config) -> (Router, Metrics) {
    let metrics = Metrics::new().expect("demo metrics should register");
    let state = AppState {
        config: Arc::new(config),
        metrics: metrics.clone(),
    };
    (create_router(state), metrics)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Value of the exposition line whose series part is exactly `series`.
pub fn series_value<'a>(rendered: &'a str, series: &str) -> Option<&'a str> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(series)?.strip_prefix(' '))
}
