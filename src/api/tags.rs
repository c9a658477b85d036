use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CreateTagRequest};
use crate::models::recipe::Tag;

/// `GET /api/tags`
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Tag>>> {
    Json(ApiResponse::success(state.recipes.list_tags().await))
}

/// `POST /api/tags`
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Tag>>), ApiError> {
    let tag = state.recipes.create_tag(&payload.name).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tag))))
}
