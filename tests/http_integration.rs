mod common;

use axum::http::{header, StatusCode};
use simple_app::metrics::TEXT_CONTENT_TYPE;
use tower::ServiceExt;

use common::{body_string, build_app, get, series_value, test_config};

#[tokio::test]
async fn gauge_endpoint_updates_metrics() {
    let (app, _metrics) = build_app(test_config());

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/gauge")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);

    let body = body_string(response).await;
    assert_eq!(series_value(&body, "simple_app_gauge"), Some("2"));
    assert_eq!(
        series_value(&body, "simple_app_status_codes{code=\"200\",method=\"GET\"}"),
        Some("2")
    );
    assert_eq!(
        series_value(
            &body,
            "simple_app_http_request_duration_seconds_count{path=\"gauge\"}"
        ),
        Some("2")
    );
    assert_eq!(
        series_value(
            &body,
            "simple_app_http_request_duration_seconds_bucket{path=\"gauge\",le=\"+Inf\"}"
        ),
        Some("2")
    );
}

#[tokio::test]
async fn bad_endpoint_answers_400_and_counts() {
    let (app, _metrics) = build_app(test_config());

    let response = app.clone().oneshot(get("/bad")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert_eq!(series_value(&body, "simple_app_bad_request_gauge"), Some("1"));
    assert_eq!(series_value(&body, "simple_app_gauge"), Some("0"));
    assert_eq!(
        series_value(&body, "simple_app_status_codes{code=\"400\",method=\"GET\"}"),
        Some("1")
    );
    assert_eq!(
        series_value(
            &body,
            "simple_app_http_request_duration_seconds_count{path=\"bad\"}"
        ),
        Some("1")
    );
}

#[tokio::test]
async fn metrics_and_health_are_not_timed() {
    let (app, _metrics) = build_app(test_config());

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    let body = body_string(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert!(body.contains("# TYPE simple_app_http_request_duration_seconds histogram\n"));
    assert!(!body.contains("simple_app_http_request_duration_seconds_count"));
}

#[tokio::test]
async fn repeated_scrapes_are_identical() {
    let (app, _metrics) = build_app(test_config());
    app.clone().oneshot(get("/gauge")).await.unwrap();

    let first = body_string(app.clone().oneshot(get("/metrics")).await.unwrap()).await;
    let second = body_string(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _metrics) = build_app(test_config());
    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
