use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("recipes", "title_search").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Recipes::Table)
                        .add_column(
                            ColumnDef::new(Recipes::TitleSearch)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .to_owned(),
                )
                .await?;
        }

        // SQL LOWER() only folds ASCII, so the backfill lowercases in Rust.
        let conn = manager.get_connection();
        let backend = manager.get_database_backend();

        let rows = conn
            .query_all(Statement::from_string(
                backend,
                "SELECT id, title FROM recipes".to_string(),
            ))
            .await?;

        for row in rows {
            let id: String = row.try_get("", "id")?;
            let title: String = row.try_get("", "title")?;

            conn.execute(Statement::from_sql_and_values(
                backend,
                "UPDATE recipes SET title_search = ? WHERE id = ?",
                [title.to_lowercase().into(), id.into()],
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.has_column("recipes", "title_search").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Recipes::Table)
                        .drop_column(Recipes::TitleSearch)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    TitleSearch,
}
