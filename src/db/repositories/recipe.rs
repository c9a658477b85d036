use crate::domain::{Difficulty, new_row_id, now_timestamp};
use crate::entities::{categories, prelude::*, recipe_categories, recipe_tags, recipes, tags};
use crate::models::recipe::{Category, Ingredient, Recipe, RecipeFormData, SearchCriteria, Tag};
use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

/// A `recipe_categories` row joined with the category it points at.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub category: categories::Model,
}

/// A `recipe_tags` row joined with the tag it points at.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub tag: tags::Model,
}

/// A recipe row with its junction rows attached, as the join returns it.
#[derive(Debug, Clone)]
pub struct RecipeRow {
    pub recipe: recipes::Model,
    pub categories: Vec<CategoryLink>,
    pub tags: Vec<TagLink>,
}

impl RecipeRow {
    /// Unwraps the junction rows into flat, name-ordered entity lists and
    /// decodes the JSON columns.
    pub fn into_recipe(self) -> Result<Recipe> {
        let model = self.recipe;

        let ingredients: Vec<Ingredient> = serde_json::from_str(&model.ingredients)
            .with_context(|| format!("Invalid ingredients JSON for recipe {}", model.id))?;
        let instructions: Vec<String> = serde_json::from_str(&model.instructions)
            .with_context(|| format!("Invalid instructions JSON for recipe {}", model.id))?;
        let difficulty: Difficulty = model
            .difficulty
            .parse()
            .with_context(|| format!("Invalid difficulty for recipe {}", model.id))?;

        let mut categories: Vec<Category> = self
            .categories
            .into_iter()
            .map(|link| Category {
                id: link.category.id,
                name: link.category.name,
                description: link.category.description,
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tags: Vec<Tag> = self
            .tags
            .into_iter()
            .map(|link| Tag {
                id: link.tag.id,
                name: link.tag.name,
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Recipe {
            id: model.id,
            title: model.title,
            description: model.description,
            ingredients,
            instructions,
            cooking_time: model.cooking_time,
            servings: model.servings,
            difficulty,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
            categories,
            tags,
        })
    }
}

/// Denormalizes a listing. Rows that fail to decode are logged and skipped so
/// one corrupt row cannot blank the whole page.
#[must_use]
pub fn denormalize(rows: Vec<RecipeRow>) -> Vec<Recipe> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.recipe.id.clone();
            match row.into_recipe() {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(recipe_id = %id, error = %e, "Skipping undecodable recipe row");
                    None
                }
            }
        })
        .collect()
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `LIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\')
}

/// Ids of owners whose junction rows cover every id in `ids`.
fn carrying_all<E, C>(junction: E, owner: C, member: C, ids: &BTreeSet<String>) -> SelectStatement
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let required = i64::try_from(ids.len()).unwrap_or(i64::MAX);

    Query::select()
        .column(owner)
        .from(junction)
        .and_where(member.is_in(ids.iter().cloned()))
        .group_by_col(owner)
        .and_having(Expr::expr(Func::count(Expr::col(member))).eq(required))
        .to_owned()
}

async fn load_rows<C>(conn: &C, models: Vec<recipes::Model>) -> Result<Vec<RecipeRow>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

    let category_links = RecipeCategories::find()
        .filter(recipe_categories::Column::RecipeId.is_in(ids.clone()))
        .find_also_related(Categories)
        .all(conn)
        .await?;

    let tag_links = RecipeTags::find()
        .filter(recipe_tags::Column::RecipeId.is_in(ids))
        .find_also_related(Tags)
        .all(conn)
        .await?;

    let mut categories_by_recipe: HashMap<String, Vec<CategoryLink>> = HashMap::new();
    for (link, category) in category_links {
        if let Some(category) = category {
            categories_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(CategoryLink { category });
        }
    }

    let mut tags_by_recipe: HashMap<String, Vec<TagLink>> = HashMap::new();
    for (link, tag) in tag_links {
        if let Some(tag) = tag {
            tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(TagLink { tag });
        }
    }

    Ok(models
        .into_iter()
        .map(|recipe| RecipeRow {
            categories: categories_by_recipe.remove(&recipe.id).unwrap_or_default(),
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect())
}

async fn link_associations<C>(
    conn: &C,
    recipe_id: &str,
    category_ids: &[String],
    tag_ids: &[String],
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !category_ids.is_empty() {
        let links: Vec<recipe_categories::ActiveModel> = category_ids
            .iter()
            .map(|category_id| recipe_categories::ActiveModel {
                recipe_id: Set(recipe_id.to_string()),
                category_id: Set(category_id.clone()),
            })
            .collect();

        RecipeCategories::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe categories")?;
    }

    if !tag_ids.is_empty() {
        let links: Vec<recipe_tags::ActiveModel> = tag_ids
            .iter()
            .map(|tag_id| recipe_tags::ActiveModel {
                recipe_id: Set(recipe_id.to_string()),
                tag_id: Set(tag_id.clone()),
            })
            .collect();

        RecipeTags::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe tags")?;
    }

    Ok(())
}

fn encode_lists(form: &RecipeFormData) -> Result<(String, String)> {
    Ok((
        serde_json::to_string(&form.ingredients)?,
        serde_json::to_string(&form.instructions)?,
    ))
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Filtered listing, newest first, with associations denormalized.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Recipe>> {
        let mut query = Recipes::find()
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id);

        if let Some(term) = &criteria.term {
            query = query.filter(
                recipes::Column::TitleSearch.like(contains_pattern(&term.to_lowercase())),
            );
        }

        if let Some(difficulty) = criteria.difficulty {
            query = query.filter(recipes::Column::Difficulty.eq(difficulty.as_str()));
        }

        if let Some(ids) = &criteria.category_ids {
            query = query.filter(recipes::Column::Id.in_subquery(carrying_all(
                RecipeCategories,
                recipe_categories::Column::RecipeId,
                recipe_categories::Column::CategoryId,
                ids,
            )));
        }

        if let Some(ids) = &criteria.tag_ids {
            query = query.filter(recipes::Column::Id.in_subquery(carrying_all(
                RecipeTags,
                recipe_tags::Column::RecipeId,
                recipe_tags::Column::TagId,
                ids,
            )));
        }

        let models = query.all(&self.conn).await?;
        let rows = load_rows(&self.conn, models).await?;

        Ok(denormalize(rows))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recipe>> {
        let Some(model) = Recipes::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        load_rows(&self.conn, vec![model])
            .await?
            .into_iter()
            .next()
            .map(RecipeRow::into_recipe)
            .transpose()
    }

    /// Writes the recipe row and its junction rows as one transaction.
    pub async fn insert(&self, form: &RecipeFormData) -> Result<Recipe> {
        let id = new_row_id();
        let now = now_timestamp();
        let (ingredients, instructions) = encode_lists(form)?;

        let txn = self.conn.begin().await?;

        Recipes::insert(recipes::ActiveModel {
            id: Set(id.clone()),
            title: Set(form.title.clone()),
            title_search: Set(form.title.to_lowercase()),
            description: Set(form.description.clone()),
            ingredients: Set(ingredients),
            instructions: Set(instructions),
            cooking_time: Set(form.cooking_time),
            servings: Set(form.servings),
            difficulty: Set(form.difficulty.as_str().to_string()),
            image_url: Set(form.image_url.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        })
        .exec_without_returning(&txn)
        .await
        .context("Failed to insert recipe")?;

        link_associations(&txn, &id, &form.category_ids, &form.tag_ids).await?;

        let model = Recipes::find_by_id(id.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created recipe"))?;
        let row = load_rows(&txn, vec![model])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created recipe"))?;

        txn.commit().await?;

        info!(recipe_id = %id, title = %form.title, "Created recipe");
        row.into_recipe()
    }

    /// Replaces scalar fields and associations. `None` when the id is unknown.
    pub async fn update(&self, id: &str, form: &RecipeFormData) -> Result<Option<Recipe>> {
        let (ingredients, instructions) = encode_lists(form)?;

        let txn = self.conn.begin().await?;

        let Some(existing) = Recipes::find_by_id(id.to_string()).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = existing.into();
        active.title = Set(form.title.clone());
        active.title_search = Set(form.title.to_lowercase());
        active.description = Set(form.description.clone());
        active.ingredients = Set(ingredients);
        active.instructions = Set(instructions);
        active.cooking_time = Set(form.cooking_time);
        active.servings = Set(form.servings);
        active.difficulty = Set(form.difficulty.as_str().to_string());
        active.image_url = Set(form.image_url.clone());
        active.updated_at = Set(now_timestamp());
        let model = active.update(&txn).await?;

        RecipeCategories::delete_many()
            .filter(recipe_categories::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        link_associations(&txn, id, &form.category_ids, &form.tag_ids).await?;

        let row = load_rows(&txn, vec![model])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve updated recipe"))?;

        txn.commit().await?;

        info!(recipe_id = %id, "Updated recipe");
        row.into_recipe().map(Some)
    }

    /// Points the recipe at a new image (or none). Returns false for unknown ids.
    pub async fn set_image_url(&self, id: &str, image_url: Option<&str>) -> Result<bool> {
        let result = Recipes::update_many()
            .col_expr(recipes::Column::ImageUrl, Expr::value(image_url))
            .col_expr(recipes::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(recipes::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes the recipe; junction rows cascade. Returns the deleted recipe.
    pub async fn delete(&self, id: &str) -> Result<Option<Recipe>> {
        let Some(recipe) = self.get(id).await? else {
            return Ok(None);
        };

        let txn = self.conn.begin().await?;

        RecipeCategories::delete_many()
            .filter(recipe_categories::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        let result = Recipes::delete_by_id(id.to_string()).exec(&txn).await?;

        txn.commit().await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!(recipe_id = %id, "Deleted recipe");
        Ok(Some(recipe))
    }

    pub async fn image_urls(&self) -> Result<Vec<String>> {
        let urls = Recipes::find()
            .select_only()
            .column(recipes::Column::ImageUrl)
            .filter(recipes::Column::ImageUrl.is_not_null())
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;

        Ok(urls)
    }

    pub async fn image_url_in_use(&self, image_url: &str) -> Result<bool> {
        use sea_orm::PaginatorTrait;

        let references = Recipes::find()
            .filter(recipes::Column::ImageUrl.eq(image_url))
            .count(&self.conn)
            .await?;

        Ok(references > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        Ok(Recipes::find().count(&self.conn).await?)
    }
}
