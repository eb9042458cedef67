//! Request pipeline behaviour, driven without a socket.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use request_gate::http::error::{FORBIDDEN_ORIGIN_MESSAGE, GENERIC_FAULT_MESSAGE};
use request_gate::observability::metrics::{
    sample_value, EXPOSITION_CONTENT_TYPE, PROCESS_RESIDENT_MEMORY_BYTES,
    PROCESS_START_TIME_SECONDS, REQUESTS_TOTAL,
};
use request_gate::security::cors::ALLOWED_METHODS;

mod common;

use common::{app, app_with, get, send, strict_config, MockStore};

fn with_origin(method: Method, uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

fn json_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

// ---- origin policy ----

#[tokio::test]
async fn test_no_origin_is_allowed() {
    let app = app();
    let res = get(&app.router, "/api/widgets/1").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_listed_origin_gets_cors_headers() {
    let app = app();
    let res = send(
        &app.router,
        with_origin(Method::GET, "/api/widgets/1", "https://app.example.com"),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
    assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_static_origins_are_allowed() {
    let app = app();
    for origin in ["http://localhost:3000", "http://localhost:3001"] {
        let res = send(&app.router, with_origin(Method::GET, "/api/widgets/1", origin)).await;
        assert_eq!(res.status, StatusCode::OK, "origin {origin}");
    }
}

#[tokio::test]
async fn test_unlisted_origin_denied_before_routing() {
    let app = app();
    let res = send(
        &app.router,
        with_origin(Method::GET, "/api/widgets/panic", "https://evil.example.com"),
    )
    .await;

    // The panicking handler never ran: the denial is a 403, not a 500.
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({ "statusCode": 403, "message": FORBIDDEN_ORIGIN_MESSAGE }));
    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_permissive_mode_allows_unlisted_origin() {
    let mut config = strict_config();
    config.cors.permissive = true;
    let app = app_with(config, MockStore::up());

    let res = send(
        &app.router,
        with_origin(Method::GET, "/api/widgets/1", "https://evil.example.com"),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://evil.example.com");
}

#[tokio::test]
async fn test_preflight_on_any_path() {
    let app = app();
    for path in ["/api/widgets/1", "/does/not/exist", "/health"] {
        let res = send(
            &app.router,
            with_origin(Method::OPTIONS, path, "http://localhost:3001"),
        )
        .await;

        assert!(res.status.is_success(), "path {path}");
        assert!(res.body.is_empty());
        assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
    }
}

#[tokio::test]
async fn test_preflight_without_origin() {
    let app = app();
    let res = send(
        &app.router,
        Request::builder().method(Method::OPTIONS).uri("/api/widgets").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

// ---- security headers ----

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = app();
    let responses = vec![
        get(&app.router, "/api/widgets/1").await,
        get(&app.router, "/nowhere").await,
        get(&app.router, "/api/widgets/explode").await,
        send(&app.router, with_origin(Method::GET, "/", "https://evil.example.com")).await,
        send(&app.router, with_origin(Method::OPTIONS, "/", "http://localhost:3000")).await,
    ];

    for res in responses {
        assert_eq!(res.headers["x-content-type-options"], "nosniff");
        assert_eq!(res.headers["x-frame-options"], "SAMEORIGIN");
        assert!(res.headers.contains_key("strict-transport-security"));
    }
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let res = get(&app.router, "/api/status").await;
    assert!(res.headers.contains_key("x-request-id"));

    let res = send(
        &app.router,
        Request::get("/api/status")
            .header("x-request-id", "trace-me-42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.headers["x-request-id"], "trace-me-42");
}

// ---- body decoder ----

#[tokio::test]
async fn test_decoded_body_reaches_handler() {
    let app = app();
    let res = send(&app.router, json_post("/api/widgets", r#"{"name":"sprocket"}"#)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json(), json!({ "name": "sprocket" }));
}

#[tokio::test]
async fn test_malformed_body_is_400_envelope() {
    let app = app();
    let res = send(&app.router, json_post("/api/widgets", r#"{"name": sprocket}"#)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let body = res.json();
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].as_str().unwrap().starts_with("Malformed JSON body"));
}

#[tokio::test]
async fn test_oversized_body_is_413_envelope() {
    let mut config = strict_config();
    config.body.limit_bytes = 16;
    let app = app_with(config, MockStore::up());

    let res = send(
        &app.router,
        json_post("/api/widgets", r#"{"name":"a much longer widget name"}"#),
    )
    .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json()["statusCode"], 413);
}

// ---- router and error funnel ----

#[tokio::test]
async fn test_unmatched_route_envelope() {
    let app = app();
    let res = get(&app.router, "/api/unknown?x=1").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.json(),
        json!({ "statusCode": 404, "message": "Cannot GET /api/unknown?x=1" })
    );
}

#[tokio::test]
async fn test_method_mismatch_is_404() {
    let app = app();
    let res = send(
        &app.router,
        Request::builder().method(Method::PUT).uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({ "statusCode": 404, "message": "Cannot PUT /health" }));
}

#[tokio::test]
async fn test_application_error_passes_status_and_message() {
    let app = app();
    let res = get(&app.router, "/api/widgets/forbidden").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({ "statusCode": 403, "message": "nope" }));
}

#[tokio::test]
async fn test_unexpected_fault_is_generic() {
    let app = app();
    let res = get(&app.router, "/api/widgets/explode").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json(), json!({ "statusCode": 500, "message": GENERIC_FAULT_MESSAGE }));
    assert!(!res.text().contains("corrupted"));
}

#[tokio::test]
async fn test_handler_panic_is_generic_500() {
    let app = app();
    let res = get(&app.router, "/api/widgets/panic").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json(), json!({ "statusCode": 500, "message": GENERIC_FAULT_MESSAGE }));
    assert!(!res.text().contains("invariant"));
}

#[tokio::test]
async fn test_extractor_shape_error() {
    let app = app();
    let res = send(&app.router, json_post("/api/widgets", r#"{"label":"x"}"#)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({ "statusCode": 400, "message": "name is required" }));
}

// ---- health ----

#[tokio::test]
async fn test_health_ok() {
    let app = app();
    let res = get(&app.router, "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_health_reports_store_failure() {
    let app = app_with(strict_config(), MockStore::down());
    let res = get(&app.router, "/health").await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json(), json!({ "status": "error", "detail": "connection refused" }));
}

#[tokio::test]
async fn test_health_never_cached() {
    let app = app();

    assert_eq!(get(&app.router, "/health").await.status, StatusCode::OK);
    app.store.set_down(true);
    assert_eq!(get(&app.router, "/health").await.status, StatusCode::SERVICE_UNAVAILABLE);
    app.store.set_down(false);
    assert_eq!(get(&app.router, "/health").await.status, StatusCode::OK);

    assert_eq!(app.store.pings(), 3);
}

// ---- metrics ----

#[tokio::test]
async fn test_metrics_count_per_route_template() {
    let app = app();
    for id in 1..=5 {
        assert_eq!(get(&app.router, &format!("/api/widgets/{id}")).await.status, StatusCode::OK);
    }

    let res = get(&app.router, "/metrics").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers[header::CONTENT_TYPE], EXPOSITION_CONTENT_TYPE);
    assert_eq!(
        sample_value(
            &res.text(),
            REQUESTS_TOTAL,
            &[("method", "GET"), ("route", "/api/widgets/{id}"), ("status", "200")]
        ),
        Some(5.0)
    );
}

#[tokio::test]
async fn test_metrics_endpoint_counts_itself() {
    let app = app();
    get(&app.router, "/metrics").await;
    let res = get(&app.router, "/metrics").await;

    assert_eq!(
        sample_value(&res.text(), REQUESTS_TOTAL, &[("route", "/metrics")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_metrics_include_process_collectors() {
    let app = app();
    let res = get(&app.router, "/metrics").await;
    let text = res.text();

    assert!(sample_value(&text, PROCESS_START_TIME_SECONDS, &[]).is_some());
    if cfg!(target_os = "linux") {
        assert!(sample_value(&text, PROCESS_RESIDENT_MEMORY_BYTES, &[]).unwrap() > 0.0);
    }
}

#[tokio::test]
async fn test_every_terminating_stage_is_observed_once() {
    let app = app();

    // denied origin, decode failure, unmatched, application error, panic
    send(&app.router, with_origin(Method::GET, "/api/widgets/1", "https://evil.example.com")).await;
    send(&app.router, json_post("/api/widgets", "{")).await;
    get(&app.router, "/missing").await;
    get(&app.router, "/api/widgets/forbidden").await;
    get(&app.router, "/api/widgets/panic").await;

    let rendered = app.metrics.render();
    let count = |labels: &[(&str, &str)]| sample_value(&rendered, REQUESTS_TOTAL, labels);

    assert_eq!(count(&[("route", "<unmatched>"), ("status", "403")]), Some(1.0));
    assert_eq!(count(&[("route", "<unmatched>"), ("status", "400")]), Some(1.0));
    assert_eq!(count(&[("route", "<unmatched>"), ("status", "404")]), Some(1.0));
    assert_eq!(count(&[("route", "/api/widgets/forbidden"), ("status", "403")]), Some(1.0));
    assert_eq!(count(&[("route", "/api/widgets/panic"), ("status", "500")]), Some(1.0));
}

// ---- fixed mounts ----

#[tokio::test]
async fn test_status_route_group() {
    let app = app();
    let res = get(&app.router, "/api/status").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "operational");
}

#[tokio::test]
async fn test_documentation_mount() {
    let app = app();

    let res = get(&app.router, "/documentation").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains("/health"));

    let res = get(&app.router, "/documentation/openapi.json").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["openapi"], "3.0.3");
}
