use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing is always newest-first.
        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_created_at")
                    .table(Recipes::Table)
                    .col(Recipes::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Reverse lookups for the containment filters.
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_categories_category_id")
                    .table(RecipeCategories::Table)
                    .col(RecipeCategories::CategoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_tags_tag_id")
                    .table(RecipeTags::Table)
                    .col(RecipeTags::TagId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_recipe_tags_tag_id").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_recipe_categories_category_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_recipes_created_at").to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RecipeCategories {
    Table,
    CategoryId,
}

#[derive(DeriveIden)]
enum RecipeTags {
    Table,
    TagId,
}
