use sea_orm::{ActiveModelTrait, Set};

use crate::{
    dto::notification::PushTokenRequest,
    entity::users,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    notifications::is_expo_push_token,
    response::ApiResponse,
    services::auth_service::load_caller,
    state::AppState,
};

pub async fn save_push_token(
    state: &AppState,
    user: &AuthUser,
    payload: PushTokenRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let token = payload
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("token is required"))?;
    if !is_expo_push_token(&token) {
        // stored anyway; delivery skips addresses the push service would reject
        tracing::warn!(user_id = %user.user_id, "push token is not in expo format");
    }

    let mut active: users::ActiveModel = load_caller(state, user).await?.into();
    active.push_token = Set(Some(token));
    active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Push token saved", serde_json::json!({})))
}
