use crate::domain::new_row_id;
use crate::entities::{categories, prelude::*};
use crate::models::recipe::Category;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::BTreeSet;

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = Categories::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn insert(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let id = new_row_id();

        Categories::insert(categories::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
        })
        .exec_without_returning(&self.conn)
        .await?;

        let created = Categories::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created category"))?;

        Ok(created.into())
    }

    /// Case-insensitive name lookup. Folding happens in Rust because SQL
    /// `LOWER()` leaves non-ASCII letters alone.
    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let wanted = name.to_lowercase();

        let names: Vec<String> = Categories::find()
            .select_only()
            .column(categories::Column::Name)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(names.iter().any(|n| n.to_lowercase() == wanted))
    }

    /// Returns the ids from `ids` that have no category row.
    pub async fn missing_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let existing: BTreeSet<String> = Categories::find()
            .filter(categories::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        Ok(ids
            .iter()
            .filter(|id| !existing.contains(*id))
            .cloned()
            .collect())
    }
}
