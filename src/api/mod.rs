use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::{CatalogStore, Store};
use crate::services::reconcile::OrphanSweeper;
use crate::services::{DefaultRecipeService, RecipeService};
use crate::storage::{LocalObjectStore, ObjectStore};

mod categories;
mod error;
mod observability;
mod recipes;
mod system;
mod tags;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

/// Multipart framing and the JSON form field ride on top of the image bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Arc<dyn CatalogStore>,

    pub recipes: Arc<dyn RecipeService>,

    pub sweeper: OrphanSweeper,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the service graph from already-constructed backends.
#[must_use]
pub fn create_app_state(
    config: Config,
    store: Arc<dyn CatalogStore>,
    objects: Arc<dyn ObjectStore>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let recipes: Arc<dyn RecipeService> = Arc::new(DefaultRecipeService::new(
        store.clone(),
        objects.clone(),
        config.storage.max_upload_bytes,
    ));

    let sweeper = OrphanSweeper::new(store.clone(), objects, config.storage.orphan_grace_minutes);

    Arc::new(AppState {
        config,
        store,
        recipes,
        sweeper,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let objects = LocalObjectStore::new(
        &config.storage.root_path,
        &config.storage.public_base_url,
    );

    Ok(create_app_state(
        config,
        Arc::new(store),
        Arc::new(objects),
        prometheus_handle,
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();
    let images_root = state.config.storage.root_path.clone();
    let images_mount = state.config.storage.public_base_url.trim_end_matches('/').to_string();
    let body_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let api_router = Router::new()
        .route(
            "/recipes",
            get(recipes::search_recipes).post(recipes::create_recipe),
        )
        .route("/recipes/with-image", post(recipes::create_recipe_with_image))
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/recipes/{id}/image", post(recipes::attach_image))
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/system/tasks/sweep", post(system::trigger_sweep))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(observability::logging_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let mut app = Router::new().nest("/api", api_router);

    // Only path-style bases are served locally; absolute URLs point at a CDN.
    if images_mount.starts_with('/') && images_mount.len() > 1 {
        app = app.nest_service(
            &images_mount,
            tower_http::services::ServeDir::new(images_root),
        );
    }

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
