pub mod prelude;

pub mod categories;
pub mod recipe_categories;
pub mod recipe_tags;
pub mod recipes;
pub mod tags;
