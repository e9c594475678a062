use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use switchyard_agents::Switchboard;
use switchyard_api::{build_router, ApiState, IpRateLimiter};
use switchyard_observability::AppMetrics;
use tower::ServiceExt;

fn app_with_limit(max_requests: usize) -> Router {
    let state = ApiState::new(
        Switchboard::rules_only(AppMetrics::shared()),
        IpRateLimiter::new(Duration::from_secs(60), max_requests),
    );
    build_router(state)
}

fn app() -> Router {
    app_with_limit(1_000)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    let body = body.to_string();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_metrics() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");

    let parsed = body_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert!(parsed["classifier_model"].is_null());
    assert_eq!(parsed["metrics"]["requests_total"], 0);
}

#[tokio::test]
async fn route_returns_decision() {
    let response = app()
        .oneshot(post_json("/v1/route", json!({ "text": "What is two plus three times five?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["input"], "What is two plus three times five?");
    assert_eq!(parsed["category"], "MATH");
    assert_eq!(parsed["subcategory"], "TEXTUAL");
    assert_eq!(parsed["confidence_source"], "PATTERN");
    assert_eq!(parsed["pipeline"], "math_text");
}

#[tokio::test]
async fn route_omits_notation_outside_math() {
    let response = app()
        .oneshot(post_json("/v1/route", json!({ "text": "Write a poem about the ocean" })))
        .await
        .unwrap();
    let parsed = body_json(response).await;
    assert_eq!(parsed["category"], "POEM");
    assert!(parsed["subcategory"].is_null());
}

#[tokio::test]
async fn empty_text_is_bad_request() {
    let response = app()
        .oneshot(post_json("/v1/route", json!({ "text": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "empty_input");
}

#[tokio::test]
async fn dispatch_runs_pipeline() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/v1/dispatch", json!({ "text": "Calculate 15 + 27 * 3" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["pipeline"], "math");
    assert_eq!(parsed["payload"]["math_expression"], "Calculate 15 + 27 * 3");
    assert_eq!(parsed["result"], "Result: 96");

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/dispatch",
            json!({ "text": "Write a poem about the ocean", "sentence_count": 2 }),
        ))
        .await
        .unwrap();
    let parsed = body_json(response).await;
    assert_eq!(parsed["payload"]["sentence_count"], 2);
    assert_eq!(parsed["result"].as_str().unwrap().lines().count(), 2);

    let response = app
        .oneshot(post_json(
            "/v1/dispatch",
            json!({ "text": "Write a poem", "sentence_count": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn evaluate_returns_numbers_and_errors() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/v1/evaluate", json!({ "expression": "2^3 + 1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"], 9);

    let response = app
        .clone()
        .oneshot(post_json("/v1/evaluate", json!({ "expression": "(10 + 5) / 3" })))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["result"], 5.0);

    let response = app
        .clone()
        .oneshot(post_json("/v1/evaluate", json!({ "expression": "10 / 0" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "division_by_zero");

    let response = app
        .oneshot(post_json("/v1/evaluate", json!({ "expression": "__import__('os')" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "unsafe_expression");
}

#[tokio::test]
async fn convert_replaces_number_words() {
    let response = app()
        .oneshot(post_json("/v1/convert", json!({ "text": "due più tre fa cinque" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["converted"], "2 più 3 fa 5");
    assert_eq!(parsed["language"], "italian");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let text = "a".repeat(32 * 1024);
    let response = app()
        .oneshot(post_json("/v1/convert", json!({ "text": text })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn rate_limit_applies_per_ip_but_not_to_health() {
    let app = app_with_limit(1);
    let from = |ip: &str| {
        let mut request = post_json("/v1/convert", json!({ "text": "one" }));
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    assert_eq!(app.clone().oneshot(from("198.51.100.1")).await.unwrap().status(), StatusCode::OK);

    let limited = app.clone().oneshot(from("198.51.100.1")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().get("retry-after").is_some());

    assert_eq!(app.clone().oneshot(from("198.51.100.2")).await.unwrap().status(), StatusCode::OK);

    for _ in 0..3 {
        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn metrics_count_routed_requests() {
    let app = app();
    for text in ["Calculate 1 + 1", "Explain tides", "Write a sonnet"] {
        let response = app
            .clone()
            .oneshot(post_json("/v1/route", json!({ "text": text })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let parsed = body_json(response).await;
    assert_eq!(parsed["requests_total"], 3);
    assert_eq!(parsed["routed_math_total"], 1);
    assert_eq!(parsed["routed_rag_total"], 1);
    assert_eq!(parsed["routed_poem_total"], 1);
    assert_eq!(parsed["pattern_fallbacks_total"], 3);
}
