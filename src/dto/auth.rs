use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Role, User},
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "client")]
    pub role: Option<String>,
}

/// Registration input after validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewAccount> {
        let name = required(self.name, "name")?;
        let email = normalize_email(required(self.email, "email")?)?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::bad_request("password is required"))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let role = required(self.role, "role")?
            .parse::<Role>()
            .map_err(AppError::BadRequest)?;

        Ok(NewAccount {
            name,
            last_name: self.last_name.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            email,
            password,
            role,
        })
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AppleLoginRequest {
    pub identity_token: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[schema(example = "client")]
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetRoleRequest {
    #[schema(example = "business")]
    pub role: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CheckEmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppleLoginResponse {
    pub user: User,
    pub token: String,
    pub is_new_user: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub iat: usize,
    pub exp: usize,
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{field} is required")))
}

pub fn normalize_email(email: String) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::bad_request("email is invalid")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: Some(" Ana ".into()),
            last_name: Some("".into()),
            email: Some("Ana@Example.com".into()),
            password: Some("hunter22".into()),
            role: Some("Business".into()),
        }
    }

    #[test]
    fn register_input_is_normalized() {
        let account = request().validate().unwrap();
        assert_eq!(account.name, "Ana");
        assert_eq!(account.last_name, None);
        assert_eq!(account.email, "ana@example.com");
        assert_eq!(account.role, Role::Business);
    }

    #[test]
    fn register_reports_the_missing_field() {
        let err = RegisterRequest {
            email: None,
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn register_rejects_short_passwords_and_unknown_roles() {
        let short = RegisterRequest {
            password: Some("abc".into()),
            ..request()
        };
        assert!(short.validate().is_err());

        let admin = RegisterRequest {
            role: Some("admin".into()),
            ..request()
        };
        assert_eq!(admin.validate().unwrap_err().to_string(), "Invalid role: admin");
    }
}
