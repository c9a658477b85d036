use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_categories::Entity")]
    RecipeCategories,
}

impl Related<super::recipe_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
