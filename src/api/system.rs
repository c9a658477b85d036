//! Health probes and operator tasks.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct SweepResultDto {
    pub scanned: usize,
    pub deleted: usize,
    pub errors: usize,
}

/// `GET /api/system/health/live`
///
/// Lightweight liveness probe to indicate the API process is running.
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/system/health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.store.ping().await.is_ok();

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready: db_ready,
            checks: HealthReadinessChecks { database: db_ready },
        })),
    )
        .into_response()
}

/// `POST /api/system/tasks/sweep`
///
/// Runs the orphaned image sweep immediately and reports what it did.
pub async fn trigger_sweep(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SweepResultDto>>, ApiError> {
    let stats = state.sweeper.sweep().await?;

    Ok(Json(ApiResponse::success(SweepResultDto {
        scanned: stats.scanned,
        deleted: stats.deleted,
        errors: stats.errors,
    })))
}
