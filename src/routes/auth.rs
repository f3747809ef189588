use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};

use crate::{
    dto::auth::{
        AppleLoginRequest, AppleLoginResponse, AuthResponse, CheckEmailRequest,
        CheckEmailResponse, LoginRequest, RegisterRequest, SetRoleRequest,
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/appleLogin", post(apple_login))
        .route("/setRole", patch(set_role))
        .route("/checkEmail", post(check_email))
        .route("/me", get(me))
        .route("/delete", delete(delete_account))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Missing field or email already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/appleLogin",
    request_body = AppleLoginRequest,
    responses(
        (status = 200, description = "Signed in with Apple", body = ApiResponse<AppleLoginResponse>),
        (status = 401, description = "Identity token rejected")
    ),
    tag = "Auth"
)]
pub async fn apple_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AppleLoginRequest>,
) -> AppResult<Json<ApiResponse<AppleLoginResponse>>> {
    let resp = auth_service::apple_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/auth/setRole",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated, fresh token issued", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid role"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn set_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<SetRoleRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = auth_service::set_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/checkEmail",
    request_body = CheckEmailRequest,
    responses(
        (status = 200, description = "Whether the email is registered", body = ApiResponse<CheckEmailResponse>)
    ),
    tag = "Auth"
)]
pub async fn check_email(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CheckEmailRequest>,
) -> AppResult<Json<ApiResponse<CheckEmailResponse>>> {
    let resp = auth_service::check_email(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/auth/delete",
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::delete_account(&state, &user).await?;
    Ok(Json(resp))
}
