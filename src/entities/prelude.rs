pub use super::categories::Entity as Categories;
pub use super::recipe_categories::Entity as RecipeCategories;
pub use super::recipe_tags::Entity as RecipeTags;
pub use super::recipes::Entity as Recipes;
pub use super::tags::Entity as Tags;
