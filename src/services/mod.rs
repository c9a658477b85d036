pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{ImageUpload, RecipeError, RecipeService};
pub use recipe_service_impl::DefaultRecipeService;

pub mod reconcile;
pub use reconcile::{OrphanSweeper, SweepStats};

pub mod scheduler;
pub use scheduler::Scheduler;
