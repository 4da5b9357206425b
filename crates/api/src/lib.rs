mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use wayfarer_agents::TripAgent;
use wayfarer_core::models::{
    BudgetTier, ChatInput, TripContext, MAX_TRAVELERS, MAX_TRIP_DAYS, MIN_TRIP_DAYS,
};
use wayfarer_core::{city_list, resolve_city};
use wayfarer_datasets::TravelDatasets;
use wayfarer_observability::{AppMetrics, MetricsSnapshot};
use wayfarer_storage::MemoryStore;
use wayfarer_weather::WeatherService;

use crate::rate_limit::IpRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<TripAgent<MemoryStore>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
}

pub async fn build_app() -> Result<Router> {
    let metrics = Arc::new(AppMetrics::new());

    let catalog = Arc::new(TravelDatasets::load().context("failed to load travel datasets")?);
    let weather = match env::var("WAYFARER_WEATHER_BASE_URL") {
        Ok(base_url) => WeatherService::with_base_url(base_url),
        Err(_) => WeatherService::new(),
    }
    .context("failed to build weather client")?;
    let store = Arc::new(MemoryStore::new());

    let agent = Arc::new(TripAgent::new(
        catalog,
        Arc::new(weather),
        store,
        metrics.clone(),
    ));

    let api_key = env::var("WAYFARER_API_KEY").unwrap_or_else(|_| "dev-wayfarer-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("WAYFARER_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("WAYFARER_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);

    let state = ApiState {
        agent,
        metrics,
        api_key,
        limiter: IpRateLimiter::new(rate_limit_window, rate_limit_max),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/plan", post(plan))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
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
    supported_cities: String,
    metrics: MetricsSnapshot,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        supported_cities: city_list(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(input): Json<ChatInput>) -> Response {
    match state.agent.handle_turn(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => {
            tracing::error!(%error, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "chat_failed",
                    "message": error.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// One-shot planning request with the slots already spelled out.
#[derive(Debug, Deserialize)]
struct PlanRequest {
    source: String,
    destination: String,
    num_days: u8,
    start_date: Option<NaiveDate>,
    num_travelers: Option<u8>,
    budget_tier: Option<BudgetTier>,
    min_hotel_stars: Option<u8>,
    max_budget: Option<i64>,
}

async fn plan(State(state): State<ApiState>, Json(request): Json<PlanRequest>) -> Response {
    let Some(source) = resolve_city(&request.source) else {
        return unknown_city_response(&request.source);
    };
    let Some(destination) = resolve_city(&request.destination) else {
        return unknown_city_response(&request.destination);
    };
    if !(MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&request.num_days) {
        return out_of_range_response("num_days", MIN_TRIP_DAYS, MAX_TRIP_DAYS);
    }
    if let Some(travelers) = request.num_travelers {
        if !(1..=MAX_TRAVELERS).contains(&travelers) {
            return out_of_range_response("num_travelers", 1, MAX_TRAVELERS);
        }
    }
    if let Some(stars) = request.min_hotel_stars {
        if !(1..=5).contains(&stars) {
            return out_of_range_response("min_hotel_stars", 1, 5);
        }
    }

    let context = TripContext {
        source: Some(source.to_string()),
        destination: Some(destination.to_string()),
        num_days: Some(request.num_days),
        start_date: request.start_date,
        num_travelers: request.num_travelers,
        budget_tier: request.budget_tier,
        min_hotel_stars: request.min_hotel_stars,
        max_budget: request.max_budget,
    };

    // Plan failures are data; only a malformed request is an HTTP error.
    match state.agent.plan_trip(&context).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(error) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "plan_failed",
                "message": error.to_string()
            })),
        )
            .into_response(),
    }
}

fn out_of_range_response(field: &str, min: u8, max: u8) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({
            "error": "out_of_range",
            "message": format!("'{field}' must be between {min} and {max}")
        })),
    )
        .into_response()
}

fn unknown_city_response(city: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({
            "error": "unknown_city",
            "message": format!("'{city}' is not a supported city"),
            "supported_cities": city_list()
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    path == "/health"
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header_key == state.api_key {
        return next.run(request).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": "missing or invalid x-api-key"
        })),
    )
        .into_response()
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
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_cors_layer() -> CorsLayer {
    let origins = env::var("WAYFARER_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5500")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}
