mod reference;
mod search;
mod sweep;

pub use reference::{cmd_list_categories, cmd_list_tags};
pub use search::cmd_search_recipes;
pub use sweep::cmd_sweep;
