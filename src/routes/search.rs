use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::search::{RecentSearch, SaveSearchRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/saveSearch", post(save_search))
        .route("/recent", get(recent_searches))
        .route("/{search_id}", delete(delete_search))
}

#[utoipa::path(
    post,
    path = "/api/search/saveSearch",
    request_body = SaveSearchRequest,
    responses(
        (status = 201, description = "Search saved or refreshed", body = ApiResponse<RecentSearch>),
        (status = 400, description = "Invalid search")
    ),
    security((), ("bearer_auth" = [])),
    tag = "Search"
)]
pub async fn save_search(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(payload): ApiJson<SaveSearchRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecentSearch>>)> {
    let resp = search_service::save_search(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/search/recent",
    responses(
        (status = 200, description = "The caller's last 10 searches", body = ApiResponse<Vec<RecentSearch>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Search"
)]
pub async fn recent_searches(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<RecentSearch>>>> {
    let resp = search_service::recent_searches(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/search/{search_id}",
    params(
        ("search_id" = Uuid, Path, description = "Search ID")
    ),
    responses(
        (status = 200, description = "Search deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Search not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Search"
)]
pub async fn delete_search(
    State(state): State<AppState>,
    user: AuthUser,
    Path(search_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = search_service::delete_search(&state, &user, search_id).await?;
    Ok(Json(resp))
}
