//! Default implementation of the `RecipeService` trait.

use crate::db::CatalogStore;
use crate::models::recipe::{Category, Recipe, RecipeFormData, RecipePatch, SearchCriteria, Tag};
use crate::services::recipe_service::{ImageUpload, RecipeError, RecipeService};
use crate::storage::{ObjectStore, new_object_key};
use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct DefaultRecipeService {
    store: Arc<dyn CatalogStore>,
    objects: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl DefaultRecipeService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        objects: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            objects,
            max_upload_bytes,
        }
    }

    fn degraded(operation: &'static str, err: &anyhow::Error) {
        error!(operation, error = %err, "Catalog read failed, returning empty result");
        metrics::counter!("ladle_degraded_reads_total", "operation" => operation).increment(1);
    }

    /// `owned_image` is the image the recipe already points at, if any.
    fn validate_form(
        &self,
        form: &RecipeFormData,
        owned_image: Option<&str>,
    ) -> Result<(), RecipeError> {
        if form.title.trim().is_empty() {
            return Err(RecipeError::Validation("Title is required".to_string()));
        }

        if form.description.trim().is_empty() {
            return Err(RecipeError::Validation("Description is required".to_string()));
        }

        for (i, ingredient) in form.ingredients.iter().enumerate() {
            if ingredient.name.trim().is_empty() {
                return Err(RecipeError::Validation(format!(
                    "Ingredient {} has no name",
                    i + 1
                )));
            }
            if ingredient.unit.trim().is_empty() {
                return Err(RecipeError::Validation(format!(
                    "Ingredient '{}' has no unit",
                    ingredient.name
                )));
            }
            if !ingredient.amount.is_finite() || ingredient.amount < 0.0 {
                return Err(RecipeError::Validation(format!(
                    "Ingredient '{}' has an invalid amount",
                    ingredient.name
                )));
            }
        }

        if let Some(i) = form.instructions.iter().position(|s| s.trim().is_empty()) {
            return Err(RecipeError::Validation(format!(
                "Instruction {} is empty",
                i + 1
            )));
        }

        if form.cooking_time <= 0 {
            return Err(RecipeError::Validation(
                "Cooking time must be greater than 0".to_string(),
            ));
        }

        if form.servings <= 0 {
            return Err(RecipeError::Validation(
                "Servings must be greater than 0".to_string(),
            ));
        }

        if let Some(image_url) = form.image_url.as_deref() {
            self.validate_image_url(image_url, owned_image)?;
        }

        Ok(())
    }

    /// Stored objects belong to one recipe; they can only be kept, never
    /// pointed at from another recipe.
    fn validate_image_url(
        &self,
        image_url: &str,
        owned_image: Option<&str>,
    ) -> Result<(), RecipeError> {
        if self.objects.key_for_url(image_url).is_some() {
            if owned_image == Some(image_url) {
                return Ok(());
            }
            return Err(RecipeError::Validation(
                "Stored images can only be attached by upload".to_string(),
            ));
        }

        if url::Url::parse(image_url).is_ok_and(|u| matches!(u.scheme(), "http" | "https")) {
            Ok(())
        } else {
            Err(RecipeError::Validation(format!(
                "Invalid image URL: {image_url}"
            )))
        }
    }

    async fn validate_references(&self, form: &RecipeFormData) -> Result<(), RecipeError> {
        let missing = self.store.missing_category_ids(&form.category_ids).await?;
        if !missing.is_empty() {
            return Err(RecipeError::Validation(format!(
                "Unknown categories: {}",
                missing.join(", ")
            )));
        }

        let missing = self.store.missing_tag_ids(&form.tag_ids).await?;
        if !missing.is_empty() {
            return Err(RecipeError::Validation(format!(
                "Unknown tags: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    fn validate_upload(&self, image: &ImageUpload) -> Result<(), RecipeError> {
        if image.bytes.is_empty() {
            return Err(RecipeError::Validation("Image is empty".to_string()));
        }

        if image.bytes.len() > self.max_upload_bytes {
            return Err(RecipeError::Validation(format!(
                "Image exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let is_image = mime_guess::from_path(&image.filename)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
        if !is_image {
            return Err(RecipeError::Validation(format!(
                "Not an image file: {}",
                image.filename
            )));
        }

        Ok(())
    }

    async fn upload(&self, image: &ImageUpload) -> Result<(String, String), RecipeError> {
        let key = new_object_key(&image.filename);

        self.objects
            .put(&key, &image.bytes)
            .await
            .map_err(|e| RecipeError::Storage(format!("{e:#}")))?;

        let url = self.objects.public_url(&key);
        Ok((key, url))
    }

    /// Removes an object whose record write failed.
    async fn compensate(&self, key: &str) {
        if let Err(e) = self.objects.delete(key).await {
            warn!(key = %key, error = %e, "Failed to remove uploaded image after failed write");
        } else {
            info!(key = %key, "Removed uploaded image after failed write");
        }
    }

    /// Deletes the stored object behind `image_url`, if this store issued it
    /// and no recipe still points at it.
    async fn release_image(&self, image_url: Option<&str>) {
        let Some((url, key)) =
            image_url.and_then(|u| self.objects.key_for_url(u).map(|k| (u, k)))
        else {
            return;
        };

        match self.store.image_url_in_use(url).await {
            Ok(false) => {}
            Ok(true) => {
                info!(key = %key, "Image still referenced, keeping it");
                return;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not check image references, leaving it to the sweep");
                return;
            }
        }

        if let Err(e) = self.objects.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to delete replaced image, leaving it to the sweep");
        }
    }
}

#[async_trait]
impl RecipeService for DefaultRecipeService {
    async fn search_recipes(&self, criteria: SearchCriteria) -> Vec<Recipe> {
        let criteria = criteria.normalized();

        match self.store.search_recipes(&criteria).await {
            Ok(recipes) => recipes,
            Err(e) => {
                Self::degraded("search_recipes", &e);
                Vec::new()
            }
        }
    }

    async fn list_categories(&self) -> Vec<Category> {
        match self.store.list_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                Self::degraded("list_categories", &e);
                Vec::new()
            }
        }
    }

    async fn list_tags(&self) -> Vec<Tag> {
        match self.store.list_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                Self::degraded("list_tags", &e);
                Vec::new()
            }
        }
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, RecipeError> {
        Ok(self.store.get_recipe(id).await?)
    }

    async fn create_recipe(&self, form: RecipeFormData) -> Result<Recipe, RecipeError> {
        let form = form.normalized();
        self.validate_form(&form, None)?;
        self.validate_references(&form).await?;

        let recipe = self.store.insert_recipe(&form).await?;

        metrics::counter!("ladle_recipes_created_total").increment(1);
        Ok(recipe)
    }

    async fn create_recipe_with_image(
        &self,
        form: RecipeFormData,
        image: ImageUpload,
    ) -> Result<Recipe, RecipeError> {
        self.validate_upload(&image)?;

        let mut form = form.normalized();
        form.image_url = None;
        self.validate_form(&form, None)?;
        self.validate_references(&form).await?;

        let (key, url) = self.upload(&image).await?;
        form.image_url = Some(url);

        match self.store.insert_recipe(&form).await {
            Ok(recipe) => {
                metrics::counter!("ladle_recipes_created_total").increment(1);
                Ok(recipe)
            }
            Err(e) => {
                self.compensate(&key).await;
                Err(e.into())
            }
        }
    }

    async fn update_recipe(&self, id: &str, changes: RecipePatch) -> Result<Recipe, RecipeError> {
        let existing = self
            .store
            .get_recipe(id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(id.to_string()))?;

        let form = changes.apply_to(&existing).normalized();
        self.validate_form(&form, existing.image_url.as_deref())?;
        self.validate_references(&form).await?;

        let recipe = self
            .store
            .update_recipe(id, &form)
            .await?
            .ok_or_else(|| RecipeError::NotFound(id.to_string()))?;

        if existing.image_url != recipe.image_url {
            self.release_image(existing.image_url.as_deref()).await;
        }

        Ok(recipe)
    }

    async fn delete_recipe(&self, id: &str) -> Result<(), RecipeError> {
        let deleted = self
            .store
            .delete_recipe(id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(id.to_string()))?;

        self.release_image(deleted.image_url.as_deref()).await;

        Ok(())
    }

    async fn attach_image(&self, id: &str, image: ImageUpload) -> Result<Recipe, RecipeError> {
        self.validate_upload(&image)?;

        let existing = self
            .store
            .get_recipe(id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(id.to_string()))?;

        let (key, url) = self.upload(&image).await?;

        match self.store.set_recipe_image(id, Some(&url)).await {
            Ok(true) => {}
            Ok(false) => {
                self.compensate(&key).await;
                return Err(RecipeError::NotFound(id.to_string()));
            }
            Err(e) => {
                self.compensate(&key).await;
                return Err(e.into());
            }
        }

        self.release_image(existing.image_url.as_deref()).await;

        info!(recipe_id = %id, key = %key, "Attached recipe image");

        self.store
            .get_recipe(id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(id.to_string()))
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, RecipeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecipeError::Validation(
                "Category name is required".to_string(),
            ));
        }

        if self.store.category_name_exists(name).await? {
            return Err(RecipeError::Conflict(format!(
                "Category '{name}' already exists"
            )));
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());

        self.store
            .insert_category(name, description)
            .await
            .map_err(|e| conflict_or(e, || format!("Category '{name}' already exists")))
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, RecipeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecipeError::Validation("Tag name is required".to_string()));
        }

        if self.store.tag_name_exists(name).await? {
            return Err(RecipeError::Conflict(format!("Tag '{name}' already exists")));
        }

        self.store
            .insert_tag(name)
            .await
            .map_err(|e| conflict_or(e, || format!("Tag '{name}' already exists")))
    }
}

/// A unique-constraint failure means a concurrent insert won the name.
fn conflict_or(err: anyhow::Error, message: impl FnOnce() -> String) -> RecipeError {
    let unique_violation = err
        .downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)));

    if unique_violation {
        RecipeError::Conflict(message())
    } else {
        err.into()
    }
}
