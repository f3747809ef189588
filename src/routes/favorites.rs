use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFavoriteRequest, FavoriteBusiness},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{business_id}", delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorite",
    responses(
        (status = 200, description = "Caller's favorite businesses", body = ApiResponse<Vec<FavoriteBusiness>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<FavoriteBusiness>>>> {
    let resp = favorite_service::list_favorites(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorite",
    request_body = AddFavoriteRequest,
    responses(
        (status = 200, description = "Added to favorites", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Business not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AddFavoriteRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::add_favorite(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/favorite/{business_id}",
    params(
        ("business_id" = Uuid, Path, description = "Business ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::remove_favorite(&state, &user, business_id).await?;
    Ok(Json(resp))
}
