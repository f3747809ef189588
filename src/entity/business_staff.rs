use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "business_staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub rating: f64,
    pub image: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business_profiles::Entity",
        from = "Column::BusinessId",
        to = "super::business_profiles::Column::Id"
    )]
    BusinessProfiles,
}

impl Related<super::business_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
