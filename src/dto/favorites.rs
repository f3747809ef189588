use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Coordinates;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub business_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteBusiness {
    pub id: Uuid,
    pub name: String,
    pub rating: f64,
    pub tag: Option<String>,
    pub image: Vec<String>,
    pub coordinates: Coordinates,
}
