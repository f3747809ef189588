use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub datetime: DateTimeWithTimeZone,
    pub status: String,
    pub total_price: i64,
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
    #[sea_orm(
        belongs_to = "super::business_profiles::Entity",
        from = "Column::BusinessId",
        to = "super::business_profiles::Column::Id"
    )]
    BusinessProfiles,
    #[sea_orm(has_many = "super::booking_services::Entity")]
    BookingServices,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::business_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessProfiles.def()
    }
}

impl Related<super::booking_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingServices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
