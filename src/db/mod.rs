use crate::models::recipe::{Category, Recipe, RecipeFormData, SearchCriteria, Tag};
use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Persistence operations the recipe service depends on.
///
/// `Store` is the `SQLite` implementation; tests substitute their own.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn search_recipes(&self, criteria: &SearchCriteria) -> Result<Vec<Recipe>>;

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>>;

    async fn insert_recipe(&self, form: &RecipeFormData) -> Result<Recipe>;

    async fn update_recipe(&self, id: &str, form: &RecipeFormData) -> Result<Option<Recipe>>;

    async fn set_recipe_image(&self, id: &str, image_url: Option<&str>) -> Result<bool>;

    async fn delete_recipe(&self, id: &str) -> Result<Option<Recipe>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn insert_category(&self, name: &str, description: Option<&str>) -> Result<Category>;

    async fn insert_tag(&self, name: &str) -> Result<Tag>;

    async fn category_name_exists(&self, name: &str) -> Result<bool>;

    async fn tag_name_exists(&self, name: &str) -> Result<bool>;

    async fn missing_category_ids(&self, ids: &[String]) -> Result<Vec<String>>;

    async fn missing_tag_ids(&self, ids: &[String]) -> Result<Vec<String>>;

    /// Every image URL currently referenced by a recipe.
    async fn referenced_image_urls(&self) -> Result<Vec<String>>;

    /// Whether any recipe still points at `image_url`.
    async fn image_url_in_use(&self, image_url: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    pub async fn recipe_count(&self) -> Result<u64> {
        self.recipe_repo().count().await
    }
}

#[async_trait::async_trait]
impl CatalogStore for Store {
    async fn search_recipes(&self, criteria: &SearchCriteria) -> Result<Vec<Recipe>> {
        self.recipe_repo().search(criteria).await
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    async fn insert_recipe(&self, form: &RecipeFormData) -> Result<Recipe> {
        self.recipe_repo().insert(form).await
    }

    async fn update_recipe(&self, id: &str, form: &RecipeFormData) -> Result<Option<Recipe>> {
        self.recipe_repo().update(id, form).await
    }

    async fn set_recipe_image(&self, id: &str, image_url: Option<&str>) -> Result<bool> {
        self.recipe_repo().set_image_url(id, image_url).await
    }

    async fn delete_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        self.recipe_repo().delete(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.category_repo().list().await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tag_repo().list().await
    }

    async fn insert_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        self.category_repo().insert(name, description).await
    }

    async fn insert_tag(&self, name: &str) -> Result<Tag> {
        self.tag_repo().insert(name).await
    }

    async fn category_name_exists(&self, name: &str) -> Result<bool> {
        self.category_repo().name_exists(name).await
    }

    async fn tag_name_exists(&self, name: &str) -> Result<bool> {
        self.tag_repo().name_exists(name).await
    }

    async fn missing_category_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        self.category_repo().missing_ids(ids).await
    }

    async fn missing_tag_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        self.tag_repo().missing_ids(ids).await
    }

    async fn referenced_image_urls(&self) -> Result<Vec<String>> {
        self.recipe_repo().image_urls().await
    }

    async fn image_url_in_use(&self, image_url: &str) -> Result<bool> {
        self.recipe_repo().image_url_in_use(image_url).await
    }

    async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}
