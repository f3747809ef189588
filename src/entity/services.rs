use sea_orm::entity::prelude::*;

/// A catalog offering. `duration` is in minutes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub duration: i32,
    pub price: i64,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_categories::Entity",
        from = "Column::CategoryId",
        to = "super::service_categories::Column::Id"
    )]
    ServiceCategories,
}

impl Related<super::service_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
