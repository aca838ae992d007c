use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;
use utoipa::ToSchema;

use crate::{ApiResponse, ApiResult, AppState};

/// Tracks application start time for uptime calculation
static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_secs: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusReport {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses((status = 200, description = "Service and database health", body = ApiResponse<HealthReport>))
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthReport> {
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(ApiResponse::success(HealthReport {
        status: if database == "healthy" { "healthy" } else { "degraded" },
        database,
        uptime_secs: uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses((status = 200, description = "Build and environment information", body = ApiResponse<StatusReport>))
)]
pub async fn api_status(State(state): State<AppState>) -> ApiResult<StatusReport> {
    Ok(Json(ApiResponse::success(StatusReport {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })))
}
