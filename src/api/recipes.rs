//! Recipe endpoints.
//!
//! Business logic lives in [`RecipeService`](crate::services::RecipeService);
//! these handlers only translate between HTTP and the service.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_recipe_id;
use super::{ApiError, ApiResponse, AppState, DeletedDto, RecipeSearchQuery};
use crate::models::recipe::{Recipe, RecipeFormData, RecipePatch};
use crate::services::ImageUpload;

/// `GET /api/recipes`
pub async fn search_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecipeSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Recipe>>>, ApiError> {
    let criteria = query.into_criteria()?;
    let recipes = state.recipes.search_recipes(criteria).await;

    Ok(Json(ApiResponse::success(recipes)))
}

/// `GET /api/recipes/{id}`
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Recipe>>, ApiError> {
    let id = validate_recipe_id(&id)?;

    let recipe = state
        .recipes
        .get_recipe(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe", id))?;

    Ok(Json(ApiResponse::success(recipe)))
}

/// `POST /api/recipes`
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RecipeFormData>,
) -> Result<(StatusCode, Json<ApiResponse<Recipe>>), ApiError> {
    let recipe = state.recipes.create_recipe(form).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

/// `POST /api/recipes/with-image`
///
/// Multipart body with a `recipe` field holding the JSON form and an `image`
/// file field.
pub async fn create_recipe_with_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Recipe>>), ApiError> {
    let parts = read_multipart(multipart).await?;

    let raw_form = parts
        .recipe
        .ok_or_else(|| ApiError::validation("Missing 'recipe' field"))?;
    let form: RecipeFormData = serde_json::from_str(&raw_form)
        .map_err(|e| ApiError::validation(format!("Invalid recipe payload: {e}")))?;
    let image = parts
        .image
        .ok_or_else(|| ApiError::validation("Missing 'image' field"))?;

    let recipe = state.recipes.create_recipe_with_image(form, image).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

/// `PUT|PATCH /api/recipes/{id}`
///
/// Fields missing from the body keep their stored value.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(changes): Json<RecipePatch>,
) -> Result<Json<ApiResponse<Recipe>>, ApiError> {
    let id = validate_recipe_id(&id)?;
    let recipe = state.recipes.update_recipe(id, changes).await?;

    Ok(Json(ApiResponse::success(recipe)))
}

/// `DELETE /api/recipes/{id}`
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    let id = validate_recipe_id(&id)?;
    state.recipes.delete_recipe(id).await?;

    Ok(Json(ApiResponse::success(DeletedDto { id: id.to_string() })))
}

/// `POST /api/recipes/{id}/image`
pub async fn attach_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Recipe>>, ApiError> {
    let id = validate_recipe_id(&id)?;

    let image = read_multipart(multipart)
        .await?
        .image
        .ok_or_else(|| ApiError::validation("Missing 'image' field"))?;

    let recipe = state.recipes.attach_image(id, image).await?;

    Ok(Json(ApiResponse::success(recipe)))
}

#[derive(Default)]
struct RecipeParts {
    recipe: Option<String>,
    image: Option<ImageUpload>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<RecipeParts, ApiError> {
    let mut parts = RecipeParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("recipe") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Unreadable 'recipe' field: {e}")))?;
                parts.recipe = Some(text);
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Unreadable 'image' field: {e}")))?;
                parts.image = Some(ImageUpload::new(filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(parts)
}
