use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    /// Unicode-lowercased title; SQLite `LIKE` only folds ASCII.
    pub title_search: String,
    pub description: String,
    /// JSON array of `{name, amount, unit}` objects.
    pub ingredients: String,
    /// JSON array of instruction steps, in order.
    pub instructions: String,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_categories::Entity")]
    RecipeCategories,
    #[sea_orm(has_many = "super::recipe_tags::Entity")]
    RecipeTags,
}

impl Related<super::recipe_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeCategories.def()
    }
}

impl Related<super::recipe_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_categories::Relation::Category.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::recipe_categories::Relation::Recipe.def().rev())
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tags::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::recipe_tags::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
