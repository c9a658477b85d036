use crate::api::create_app_state_from_config;
use crate::config::Config;
use crate::domain::Difficulty;
use crate::models::recipe::SearchCriteria;

pub async fn cmd_search_recipes(
    config: &Config,
    term: &[String],
    difficulty: Option<Difficulty>,
    categories: Vec<String>,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let state = create_app_state_from_config(config.clone(), None).await?;

    let mut criteria = SearchCriteria::default()
        .with_term(term.join(" "))
        .with_categories(categories)
        .with_tags(tags);
    criteria.difficulty = difficulty;

    let recipes = state.recipes.search_recipes(criteria).await;

    if recipes.is_empty() {
        println!("No recipes found.");
        return Ok(());
    }

    println!("Recipes ({} total)", recipes.len());
    println!("{:-<70}", "");

    for recipe in recipes {
        println!(
            "• {} [{}] {} min, serves {}",
            recipe.title, recipe.difficulty, recipe.cooking_time, recipe.servings
        );

        let categories: Vec<&str> = recipe.categories.iter().map(|c| c.name.as_str()).collect();
        let tags: Vec<&str> = recipe.tags.iter().map(|t| t.name.as_str()).collect();
        if !categories.is_empty() || !tags.is_empty() {
            println!(
                "  Categories: {} | Tags: {}",
                categories.join(", "),
                tags.join(", ")
            );
        }
        println!("  ID: {}", recipe.id);
    }

    Ok(())
}
