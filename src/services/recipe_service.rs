//! Domain service for the recipe catalog.
//!
//! Search and reference-data listings never fail from the caller's point of
//! view: backend failures are logged and yield an empty list. Single-recipe
//! reads and every write surface a typed [`RecipeError`].

use crate::models::recipe::{Category, Recipe, RecipeFormData, RecipePatch, SearchCriteria, Tag};
use thiserror::Error;

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Errors specific to recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            Self::Database(format!("{err:#}"))
        } else {
            Self::Internal(format!("{err:#}"))
        }
    }
}

/// Domain service trait for recipes and their reference data.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Lists recipes matching every present filter, newest first.
    async fn search_recipes(&self, criteria: SearchCriteria) -> Vec<Recipe>;

    /// All categories, sorted by name.
    async fn list_categories(&self) -> Vec<Category>;

    /// All tags, sorted by name.
    async fn list_tags(&self) -> Vec<Tag>;

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, RecipeError>;

    /// Creates a recipe with its category and tag associations.
    async fn create_recipe(&self, form: RecipeFormData) -> Result<Recipe, RecipeError>;

    /// Uploads the image, then creates the recipe pointing at it.
    async fn create_recipe_with_image(
        &self,
        form: RecipeFormData,
        image: ImageUpload,
    ) -> Result<Recipe, RecipeError>;

    /// Applies a partial edit; fields absent from `changes` keep their value.
    async fn update_recipe(&self, id: &str, changes: RecipePatch) -> Result<Recipe, RecipeError>;

    async fn delete_recipe(&self, id: &str) -> Result<(), RecipeError>;

    /// Replaces the recipe's image with a new upload.
    async fn attach_image(&self, id: &str, image: ImageUpload) -> Result<Recipe, RecipeError>;

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, RecipeError>;

    async fn create_tag(&self, name: &str) -> Result<Tag, RecipeError>;
}
