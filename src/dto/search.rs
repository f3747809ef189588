use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSearchRequest {
    pub from: String,
    pub to: String,
    pub from_entity_id: String,
    pub to_entity_id: String,
    pub from_sky_id: Option<String>,
    pub to_sky_id: Option<String>,
    pub departure: NaiveDate,
    #[serde(rename = "return")]
    pub return_date: Option<NaiveDate>,
    pub cabin_class: String,
    #[serde(default)]
    pub passengers: Passengers,
    pub book_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Passengers {
    pub adult: i32,
    #[serde(default)]
    pub child: i32,
    #[serde(default)]
    pub infant: i32,
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adult: 1,
            child: 0,
            infant: 0,
        }
    }
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RecentSearch {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub from_city: String,
    pub to_city: String,
    pub from_entity_id: String,
    pub to_entity_id: String,
    pub from_sky_id: Option<String>,
    pub to_sky_id: Option<String>,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: String,
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
    pub book_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
