//! Route configuration and setup

use crate::constants::{
    BODY_LIMIT_HEADROOM, DEFAULT_HTTP_CONCURRENCY_LIMIT, HEALTH_PATH, LOCALIZED_SUBMIT_PATH,
    OPENAPI_PATH, SUBMIT_PATH,
};
use crate::error::HttpAppError;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use portal_core::{AppError, Config};
use portal_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);
    let body_limit = config
        .upload
        .max_upload_bytes
        .saturating_add(BODY_LIMIT_HEADROOM);
    let request_timeout = Duration::from_secs(config.request_timeout_secs.max(1));

    tracing::info!(
        http_concurrency_limit,
        body_limit,
        request_timeout_secs = request_timeout.as_secs(),
        "HTTP limits configured"
    );

    let app = Router::new()
        .route(SUBMIT_PATH, post(handlers::submit::submit))
        .route(LOCALIZED_SUBMIT_PATH, post(handlers::submit::submit_localized))
        .route(HEALTH_PATH, get(handlers::health::health_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .fallback(not_found)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        // Enforced while the handler reads the body, after the rate check
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

async fn not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Not found".to_string()))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
