use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when the database answers, `unhealthy` otherwise
    pub status: String,
    /// Backend answering rate limit checks: `redis`, `memory` or `disabled`
    pub rate_limit_backend: String,
    pub environment: String,
    pub database: String,
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(CHECK_TIMEOUT, state.intake.repository().ping()).await
    {
        Ok(Ok(())) => "healthy",
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            "unhealthy"
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            "timeout"
        }
    };

    let healthy = database == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            rate_limit_backend: state.rate_limiter.backend_name().to_string(),
            environment: state.config.environment.clone(),
            database: database.to_string(),
        }),
    )
}
