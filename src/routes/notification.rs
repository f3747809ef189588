use axum::{Json, Router, extract::State, routing::patch};

use crate::{
    dto::notification::PushTokenRequest,
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::notification_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/token", patch(save_push_token))
}

#[utoipa::path(
    patch,
    path = "/api/notification/token",
    request_body = PushTokenRequest,
    responses(
        (status = 200, description = "Push token stored", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Missing token"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn save_push_token(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<PushTokenRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = notification_service::save_push_token(&state, &user, payload).await?;
    Ok(Json(resp))
}
