use crate::domain::new_row_id;
use crate::entities::{prelude::*, tags};
use crate::models::recipe::Tag;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::BTreeSet;

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl From<tags::Model> for Tag {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    pub async fn insert(&self, name: &str) -> Result<Tag> {
        let id = new_row_id();

        Tags::insert(tags::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
        })
        .exec_without_returning(&self.conn)
        .await?;

        let created = Tags::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created tag"))?;

        Ok(created.into())
    }

    /// Case-insensitive name lookup. Folding happens in Rust because SQL
    /// `LOWER()` leaves non-ASCII letters alone.
    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let wanted = name.to_lowercase();

        let names: Vec<String> = Tags::find()
            .select_only()
            .column(tags::Column::Name)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(names.iter().any(|n| n.to_lowercase() == wanted))
    }

    /// Returns the ids from `ids` that have no tag row.
    pub async fn missing_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let existing: BTreeSet<String> = Tags::find()
            .filter(tags::Column::Id.is_in(ids.iter().cloned()))
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
