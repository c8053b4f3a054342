//! Request/response payloads for registration and login.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PASSWORD_MIN, USERNAME_MAX, USERNAME_MIN};
use crate::api::handlers::ApiError;
use crate::store::Administrator;

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(min_length = 3, max_length = 50, example = "admin")]
    pub username: String,
    #[schema(min_length = 6, format = Password)]
    pub password: String,
}

/// Login form, sent as `application/x-www-form-urlencoded`.
#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    #[schema(format = Password)]
    pub password: String,
}

/// Public view of an administrator; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    pub id: i64,
    pub username: String,
}

impl From<Administrator> for AdminResponse {
    fn from(admin: Administrator) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl TokenResponse {
    #[must_use]
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Validate a username for registration; returns it trimmed.
///
/// # Errors
/// Returns a validation error when the length is outside 3..=50 characters.
pub fn validate_username(username: &str) -> Result<String, ApiError> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::Validation(format!(
            "username must have between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Passwords are not trimmed; only the length is checked.
///
/// # Errors
/// Returns a validation error when the password is too short.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::Validation(format!(
            "password must have at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}
