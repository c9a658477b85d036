use crate::api::create_app_state_from_config;
use crate::config::Config;

pub async fn cmd_list_categories(config: &Config) -> anyhow::Result<()> {
    let state = create_app_state_from_config(config.clone(), None).await?;
    let categories = state.recipes.list_categories().await;

    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }

    for category in categories {
        match category.description.as_deref() {
            Some(description) => println!("• {} - {}", category.name, description),
            None => println!("• {}", category.name),
        }
        println!("  ID: {}", category.id);
    }

    Ok(())
}

pub async fn cmd_list_tags(config: &Config) -> anyhow::Result<()> {
    let state = create_app_state_from_config(config.clone(), None).await?;
    let tags = state.recipes.list_tags().await;

    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }

    for tag in tags {
        println!("• {} ({})", tag.name, tag.id);
    }

    Ok(())
}
