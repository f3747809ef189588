use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "business_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub about: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub tag: Option<String>,
    pub rating: f64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::service_categories::Entity")]
    ServiceCategories,
    #[sea_orm(has_many = "super::business_staff::Entity")]
    BusinessStaff,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::service_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceCategories.def()
    }
}

impl Related<super::business_staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessStaff.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
