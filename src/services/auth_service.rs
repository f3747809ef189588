use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        AppleLoginRequest, AppleLoginResponse, AuthResponse, CheckEmailRequest,
        CheckEmailResponse, LoginRequest, RegisterRequest, SetRoleRequest, normalize_email,
    },
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult},
    identity::IdentityError,
    middleware::auth::{AuthUser, issue_token},
    models::{Role, User},
    response::ApiResponse,
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?)
}

/// A concurrent sign-up can pass the lookup and still lose on `UNIQUE(email)`.
fn email_taken_or(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email is already taken".to_string())
        }
        _ => err.into(),
    }
}

/// Load the caller's row; a valid token for a deleted account is unauthorized.
pub async fn load_caller(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let account = payload.validate()?;

    if find_by_email(state, &account.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(account.name),
        last_name: Set(account.last_name),
        email: Set(account.email),
        password_hash: Set(Some(hash_password(&account.password)?)),
        role: Set(Some(account.role.as_str().to_string())),
        apple_id: Set(None),
        push_token: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(email_taken_or)?;

    tracing::info!(user_id = %user.id, role = %account.role, "user registered");
    let token = issue_token(&state.jwt_secret, &user)?;
    Ok(ApiResponse::ok(
        "User created",
        AuthResponse {
            user: user.into(),
            token,
        },
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user = find_by_email(state, &email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;
    // Apple-only accounts have no password to check against.
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&password, hash)? {
        return Err(invalid());
    }

    let token = issue_token(&state.jwt_secret, &user)?;
    Ok(ApiResponse::ok(
        "Logged in",
        AuthResponse {
            user: user.into(),
            token,
        },
    ))
}

pub async fn apple_login(
    state: &AppState,
    payload: AppleLoginRequest,
) -> AppResult<ApiResponse<AppleLoginResponse>> {
    let identity = state
        .identity
        .verify(&payload.identity_token)
        .await
        .map_err(|err| match err {
            IdentityError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "apple identity token rejected");
                AppError::Unauthorized("Invalid Apple identity token".into())
            }
            other => AppError::Internal(anyhow::anyhow!(other)),
        })?;

    if let Some(user) = Users::find()
        .filter(UserCol::AppleId.eq(identity.subject.as_str()))
        .one(&state.orm)
        .await?
    {
        return apple_session(state, user, false);
    }

    let email = identity
        .email
        .ok_or_else(|| AppError::bad_request("Apple account did not share an email address"))?;

    // An account registered with the same email gets linked to this Apple id.
    if let Some(existing) = find_by_email(state, &email).await? {
        let mut active: UserActive = existing.into();
        active.apple_id = Set(Some(identity.subject));
        let user = active.update(&state.orm).await?;
        tracing::info!(user_id = %user.id, "linked apple id to existing account");
        return apple_session(state, user, false);
    }

    let role = payload
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.unwrap_or_default().trim().to_string()),
        last_name: Set(payload.last_name.filter(|l| !l.trim().is_empty())),
        email: Set(email),
        password_hash: Set(None),
        role: Set(role.map(|r| r.as_str().to_string())),
        apple_id: Set(Some(identity.subject)),
        push_token: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(email_taken_or)?;
    tracing::info!(user_id = %user.id, "user registered with apple");
    apple_session(state, user, true)
}

fn apple_session(
    state: &AppState,
    user: UserModel,
    is_new_user: bool,
) -> AppResult<ApiResponse<AppleLoginResponse>> {
    let token = issue_token(&state.jwt_secret, &user)?;
    Ok(ApiResponse::ok(
        "Logged in",
        AppleLoginResponse {
            user: user.into(),
            token,
            is_new_user,
        },
    ))
}

pub async fn set_role(
    state: &AppState,
    user: &AuthUser,
    payload: SetRoleRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let role = payload.role.parse::<Role>().map_err(AppError::BadRequest)?;
    let mut active: UserActive = load_caller(state, user).await?.into();
    active.role = Set(Some(role.as_str().to_string()));
    let updated = active.update(&state.orm).await?;

    // the role is carried in the token, so hand out a fresh one
    let token = issue_token(&state.jwt_secret, &updated)?;
    Ok(ApiResponse::ok(
        "Role updated",
        AuthResponse {
            user: updated.into(),
            token,
        },
    ))
}

pub async fn check_email(
    state: &AppState,
    payload: CheckEmailRequest,
) -> AppResult<ApiResponse<CheckEmailResponse>> {
    let email = payload
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("email is required"))?;
    let email = normalize_email(email)?;
    let exists = Users::find()
        .filter(UserCol::Email.eq(email))
        .count(&state.orm)
        .await?
        > 0;
    Ok(ApiResponse::ok("OK", CheckEmailResponse { exists }))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::ok("OK", model.into()))
}

pub async fn delete_account(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Users::delete_by_id(user.user_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User"));
    }
    tracing::info!(user_id = %user.user_id, "account deleted");
    Ok(ApiResponse::ok("Account deleted", serde_json::json!({})))
}
