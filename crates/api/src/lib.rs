mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use switchyard_agents::{Switchboard, MAX_SENTENCES};
use switchyard_core::{ExpressionError, Language, Number, RoutingDecision, RoutingError};
use switchyard_observability::{AppMetrics, MetricsSnapshot};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

pub use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub switchboard: Arc<Switchboard>,
    pub limiter: IpRateLimiter,
}

impl ApiState {
    pub fn new(switchboard: Switchboard, limiter: IpRateLimiter) -> Self {
        Self {
            switchboard: Arc::new(switchboard),
            limiter,
        }
    }

    fn metrics(&self) -> &Arc<AppMetrics> {
        self.switchboard.metrics()
    }
}

/// Builds the service from `SWITCHYARD_*` environment settings.
pub async fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();
    let switchboard = Switchboard::load_default(metrics);

    let rate_limit_window = Duration::from_secs(
        env::var("SWITCHYARD_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("SWITCHYARD_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);

    let state = ApiState::new(
        switchboard,
        IpRateLimiter::new(rate_limit_window, rate_limit_max),
    );
    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/v1/route", post(route))
        .route("/v1/dispatch", post(dispatch))
        .route("/v1/evaluate", post(evaluate))
        .route("/v1/convert", post(convert))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    classifier_model: Option<&'static str>,
    metrics: MetricsSnapshot,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        classifier_model: state.switchboard.router().classifier().model_name(),
        metrics: state.metrics().snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn metrics_snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics().snapshot()))
}

#[derive(Debug, Deserialize)]
struct RouteRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct RouteResponse {
    #[serde(flatten)]
    decision: RoutingDecision,
    pipeline: &'static str,
}

async fn route(State(state): State<ApiState>, Json(request): Json<RouteRequest>) -> Response {
    match state.switchboard.route(&request.text).await {
        Ok(decision) => {
            let pipeline = decision.pipeline().as_str();
            (StatusCode::OK, Json(RouteResponse { decision, pipeline })).into_response()
        }
        Err(err) => routing_error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
struct DispatchRequest {
    text: String,
    sentence_count: Option<u8>,
}

async fn dispatch(State(state): State<ApiState>, Json(request): Json<DispatchRequest>) -> Response {
    if let Some(count) = request.sentence_count {
        if !(1..=MAX_SENTENCES).contains(&count) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_sentence_count",
                format!("sentence_count must be between 1 and {MAX_SENTENCES}"),
            );
        }
    }

    match state
        .switchboard
        .handle(&request.text, request.sentence_count)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => match err.downcast_ref::<RoutingError>() {
            Some(routing) => routing_error_response(routing),
            None => {
                error!(error = ?err, "dispatch failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "dispatch_failed",
                    "the selected pipeline could not process this request",
                )
            }
        },
    }
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    expression: String,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    expression: String,
    result: Number,
}

async fn evaluate(State(state): State<ApiState>, Json(request): Json<EvaluateRequest>) -> Response {
    match state.switchboard.evaluate(&request.expression) {
        Ok(result) => (
            StatusCode::OK,
            Json(EvaluateResponse {
                expression: request.expression,
                result,
            }),
        )
            .into_response(),
        Err(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            expression_error_code(&err),
            err.to_string(),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct ConvertRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    text: String,
    converted: String,
    language: Option<Language>,
}

async fn convert(State(state): State<ApiState>, Json(request): Json<ConvertRequest>) -> Response {
    let converted = state.switchboard.convert(&request.text);
    let language = state.switchboard.detect_language(&request.text);
    (
        StatusCode::OK,
        Json(ConvertResponse {
            text: request.text,
            converted,
            language,
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into()
        })),
    )
        .into_response()
}

fn routing_error_response(err: &RoutingError) -> Response {
    match err {
        RoutingError::EmptyInput => {
            error_response(StatusCode::BAD_REQUEST, "empty_input", err.to_string())
        }
    }
}

fn expression_error_code(err: &ExpressionError) -> &'static str {
    match err {
        ExpressionError::UnsafeExpression { .. } => "unsafe_expression",
        ExpressionError::MalformedExpression(_) => "malformed_expression",
        ExpressionError::DivisionByZero => "division_by_zero",
        ExpressionError::NumericOverflow => "numeric_overflow",
        ExpressionError::UndefinedResult => "undefined_result",
    }
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let Err(retry_after) = state.limiter.check(&ip) {
        let mut response = error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded for this IP",
        );
        let seconds = retry_after.as_secs().max(1).to_string();
        if let Ok(value) = HeaderValue::from_str(&seconds) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health" | "/metrics")
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}
