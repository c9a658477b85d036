use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CreateCategoryRequest};
use crate::models::recipe::Category;

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<Category>>> {
    Json(ApiResponse::success(state.recipes.list_categories().await))
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let category = state
        .recipes
        .create_category(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}
