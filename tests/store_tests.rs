//! Query construction and normalization against a real SQLite catalog.

use ladle::db::{CatalogStore, Store};
use ladle::domain::Difficulty;
use ladle::models::recipe::{Ingredient, RecipeFormData, SearchCriteria};

async fn temp_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("ladle-store-test-{}.db", uuid::Uuid::new_v4()));

    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store")
}

fn form(title: &str, difficulty: Difficulty, categories: &[&str], tags: &[&str]) -> RecipeFormData {
    RecipeFormData {
        title: title.to_string(),
        description: format!("How to make {title}"),
        ingredients: vec![Ingredient {
            name: "salt".to_string(),
            amount: 1.0,
            unit: "tsp".to_string(),
        }],
        instructions: vec!["Cook".to_string()],
        cooking_time: 30,
        servings: 4,
        difficulty,
        image_url: None,
        category_ids: categories.iter().map(|s| (*s).to_string()).collect(),
        tag_ids: tags.iter().map(|s| (*s).to_string()).collect(),
    }
}

struct Fixture {
    store: Store,
    dinner: String,
    soups: String,
    dessert: String,
    quick: String,
    vegan: String,
}

async fn fixture() -> Fixture {
    let store = temp_store().await;

    let dinner = store.insert_category("Dinner", None).await.unwrap().id;
    let soups = store
        .insert_category("Soups", Some("Warm bowls"))
        .await
        .unwrap()
        .id;
    let dessert = store.insert_category("Dessert", None).await.unwrap().id;
    let quick = store.insert_tag("quick").await.unwrap().id;
    let vegan = store.insert_tag("vegan").await.unwrap().id;

    Fixture {
        store,
        dinner,
        soups,
        dessert,
        quick,
        vegan,
    }
}

fn titles(recipes: &[ladle::models::recipe::Recipe]) -> Vec<&str> {
    recipes.iter().map(|r| r.title.as_str()).collect()
}

#[tokio::test]
async fn test_unfiltered_search_is_newest_first() {
    let f = fixture().await;

    for title in ["First", "Second", "Third"] {
        f.store
            .insert_recipe(&form(title, Difficulty::Easy, &[], &[]))
            .await
            .unwrap();
    }

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default())
        .await
        .unwrap();

    assert_eq!(titles(&recipes), vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_title_filter_is_case_insensitive_substring() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form("Chicken Soup", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Roast chicken", Difficulty::Medium, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Tomato Salad", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();

    let criteria = SearchCriteria::default().with_term("CHICKEN");
    let recipes = f.store.search_recipes(&criteria).await.unwrap();

    assert_eq!(titles(&recipes), vec!["Roast chicken", "Chicken Soup"]);
}

#[tokio::test]
async fn test_title_filter_treats_wildcards_literally() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form("100% Rye Bread", Difficulty::Hard, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Plain Bread", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("snake_case cookies", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default().with_term("%"))
        .await
        .unwrap();
    assert_eq!(titles(&recipes), vec!["100% Rye Bread"]);

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default().with_term("e_c"))
        .await
        .unwrap();
    assert_eq!(titles(&recipes), vec!["snake_case cookies"]);
}

#[tokio::test]
async fn test_title_filter_folds_non_ascii_case() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form("Борщ украинский", Difficulty::Hard, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Chicken Soup", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();

    for term in ["борщ", "БОРЩ", "Украинский"] {
        let recipes = f
            .store
            .search_recipes(&SearchCriteria::default().with_term(term))
            .await
            .unwrap();
        assert_eq!(titles(&recipes), vec!["Борщ украинский"], "term {term}");
    }

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default().with_term("chicken"))
        .await
        .unwrap();
    assert_eq!(titles(&recipes), vec!["Chicken Soup"]);
}

#[tokio::test]
async fn test_title_search_column_is_backfilled_on_upgrade() {
    use ladle::db::migrator::Migrator;
    use sea_orm_migration::MigratorTrait;

    let f = fixture().await;
    f.store
        .insert_recipe(&form("Пельмени", Difficulty::Medium, &[], &[]))
        .await
        .unwrap();

    // Roll back to the schema without the search column, then upgrade again.
    Migrator::down(&f.store.conn, Some(1)).await.unwrap();
    Migrator::up(&f.store.conn, None).await.unwrap();

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default().with_term("ПЕЛЬМ"))
        .await
        .unwrap();
    assert_eq!(titles(&recipes), vec!["Пельмени"]);
}

#[tokio::test]
async fn test_difficulty_filter() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form("Toast", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Souffle", Difficulty::Hard, &[], &[]))
        .await
        .unwrap();

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default().with_difficulty(Difficulty::Hard))
        .await
        .unwrap();

    assert_eq!(titles(&recipes), vec!["Souffle"]);
    assert!(recipes.iter().all(|r| r.difficulty == Difficulty::Hard));
}

#[tokio::test]
async fn test_category_filter_requires_every_selected_category() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form(
            "Minestrone",
            Difficulty::Medium,
            &[&f.dinner, &f.soups],
            &[],
        ))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Steak", Difficulty::Medium, &[&f.dinner], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Brownies", Difficulty::Easy, &[&f.dessert], &[]))
        .await
        .unwrap();

    let both = SearchCriteria::default().with_categories([f.dinner.clone(), f.soups.clone()]);
    let recipes = f.store.search_recipes(&both).await.unwrap();
    assert_eq!(titles(&recipes), vec!["Minestrone"]);

    let dinner_only = SearchCriteria::default().with_categories([f.dinner.clone()]);
    let recipes = f.store.search_recipes(&dinner_only).await.unwrap();
    assert_eq!(titles(&recipes), vec!["Steak", "Minestrone"]);

    for recipe in &recipes {
        assert!(recipe.categories.iter().any(|c| c.id == f.dinner));
    }
}

#[tokio::test]
async fn test_tag_filter_requires_every_selected_tag() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form(
            "Lentil Soup",
            Difficulty::Easy,
            &[],
            &[&f.quick, &f.vegan],
        ))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Omelette", Difficulty::Easy, &[], &[&f.quick]))
        .await
        .unwrap();

    let criteria = SearchCriteria::default().with_tags([f.quick.clone(), f.vegan.clone()]);
    let recipes = f.store.search_recipes(&criteria).await.unwrap();

    assert_eq!(titles(&recipes), vec!["Lentil Soup"]);
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form(
            "Quick Tomato Soup",
            Difficulty::Easy,
            &[&f.soups],
            &[&f.quick],
        ))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form(
            "Slow Tomato Soup",
            Difficulty::Hard,
            &[&f.soups],
            &[&f.quick],
        ))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Tomato Toast", Difficulty::Easy, &[], &[&f.quick]))
        .await
        .unwrap();

    let criteria = SearchCriteria::default()
        .with_term("tomato")
        .with_difficulty(Difficulty::Easy)
        .with_categories([f.soups.clone()])
        .with_tags([f.quick.clone()]);
    let recipes = f.store.search_recipes(&criteria).await.unwrap();

    assert_eq!(titles(&recipes), vec!["Quick Tomato Soup"]);
}

#[tokio::test]
async fn test_results_carry_flat_sorted_associations() {
    let f = fixture().await;

    f.store
        .insert_recipe(&form(
            "Gazpacho",
            Difficulty::Easy,
            &[&f.soups, &f.dinner],
            &[&f.vegan, &f.quick],
        ))
        .await
        .unwrap();

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default())
        .await
        .unwrap();
    let recipe = &recipes[0];

    let category_names: Vec<&str> = recipe.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(category_names, vec!["Dinner", "Soups"]);
    assert_eq!(
        recipe.categories[1].description.as_deref(),
        Some("Warm bowls")
    );

    let tag_names: Vec<&str> = recipe.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["quick", "vegan"]);

    assert_eq!(recipe.ingredients[0].name, "salt");
    assert_eq!(recipe.instructions, vec!["Cook"]);
}

#[tokio::test]
async fn test_failed_junction_write_leaves_no_recipe() {
    let f = fixture().await;

    // The composite key rejects the second link, failing the transaction.
    let result = f
        .store
        .insert_recipe(&form(
            "Doomed",
            Difficulty::Easy,
            &[&f.dinner, &f.dinner],
            &[],
        ))
        .await;
    assert!(result.is_err());

    let recipes = f
        .store
        .search_recipes(&SearchCriteria::default())
        .await
        .unwrap();
    assert!(recipes.is_empty());
    assert_eq!(f.store.recipe_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_replaces_fields_and_associations() {
    let f = fixture().await;

    let created = f
        .store
        .insert_recipe(&form(
            "Stew",
            Difficulty::Medium,
            &[&f.dinner],
            &[&f.quick],
        ))
        .await
        .unwrap();

    let mut edit = form("Beef Stew", Difficulty::Hard, &[&f.soups], &[]);
    edit.servings = 6;

    let updated = f
        .store
        .update_recipe(&created.id, &edit)
        .await
        .unwrap()
        .expect("recipe should exist");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Beef Stew");
    assert_eq!(updated.servings, 6);
    assert_eq!(updated.difficulty, Difficulty::Hard);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let category_ids: Vec<&str> = updated.categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(category_ids, vec![f.soups.as_str()]);
    assert!(updated.tags.is_empty());

    let by_dinner = SearchCriteria::default().with_categories([f.dinner.clone()]);
    assert!(f.store.search_recipes(&by_dinner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_unknown_recipe_returns_none() {
    let f = fixture().await;

    let result = f
        .store
        .update_recipe("missing", &form("Ghost", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_removes_recipe_and_links() {
    let f = fixture().await;

    let created = f
        .store
        .insert_recipe(&form("Pie", Difficulty::Medium, &[&f.dessert], &[&f.quick]))
        .await
        .unwrap();

    let deleted = f.store.delete_recipe(&created.id).await.unwrap();
    assert_eq!(deleted.map(|r| r.id), Some(created.id.clone()));

    assert!(f.store.get_recipe(&created.id).await.unwrap().is_none());
    assert!(f.store.delete_recipe(&created.id).await.unwrap().is_none());

    let by_dessert = SearchCriteria::default().with_categories([f.dessert.clone()]);
    assert!(f.store.search_recipes(&by_dessert).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reference_data_is_sorted_by_name() {
    let f = fixture().await;

    let categories = f.store.list_categories().await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Dessert", "Dinner", "Soups"]);

    let tags = f.store.list_tags().await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["quick", "vegan"]);
}

#[tokio::test]
async fn test_reference_lookups() {
    let f = fixture().await;

    assert!(f.store.category_name_exists("dinner").await.unwrap());
    assert!(!f.store.category_name_exists("Breakfast").await.unwrap());
    assert!(f.store.tag_name_exists("QUICK").await.unwrap());

    f.store.insert_category("Супы", None).await.unwrap();
    assert!(f.store.category_name_exists("Супы").await.unwrap());
    assert!(f.store.category_name_exists("супы").await.unwrap());
    assert!(f.store.category_name_exists("СУПЫ").await.unwrap());

    let missing = f
        .store
        .missing_category_ids(&[f.dinner.clone(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(missing, vec!["nope"]);

    assert!(f.store.missing_tag_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_image_urls_and_set_image() {
    let f = fixture().await;

    let created = f
        .store
        .insert_recipe(&form("Pizza", Difficulty::Medium, &[], &[]))
        .await
        .unwrap();
    f.store
        .insert_recipe(&form("Pasta", Difficulty::Easy, &[], &[]))
        .await
        .unwrap();

    assert!(f.store.referenced_image_urls().await.unwrap().is_empty());

    assert!(
        f.store
            .set_recipe_image(&created.id, Some("/images/pizza.png"))
            .await
            .unwrap()
    );
    assert!(
        !f.store
            .set_recipe_image("missing", Some("/images/x.png"))
            .await
            .unwrap()
    );

    assert_eq!(
        f.store.referenced_image_urls().await.unwrap(),
        vec!["/images/pizza.png"]
    );

    let reloaded = f.store.get_recipe(&created.id).await.unwrap().unwrap();
    assert_eq!(reloaded.image_url.as_deref(), Some("/images/pizza.png"));

    assert!(f.store.image_url_in_use("/images/pizza.png").await.unwrap());
    assert!(!f.store.image_url_in_use("/images/pasta.png").await.unwrap());
}

#[tokio::test]
async fn test_ping() {
    let f = fixture().await;
    assert!(f.store.ping().await.is_ok());
}

#[tokio::test]
async fn test_unusable_database_directory_is_reported() {
    let blocker =
        std::env::temp_dir().join(format!("ladle-store-blocker-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();

    let db_path = blocker.join("nested").join("ladle.db");
    let err = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .err()
        .expect("opening under a regular file must fail");

    assert!(
        format!("{err:#}").contains("Failed to create database directory"),
        "got {err:#}"
    );

    let _ = std::fs::remove_file(&blocker);
}
