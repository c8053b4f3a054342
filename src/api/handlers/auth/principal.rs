//! Authenticated principal extraction (the access gate).
//!
//! Flow Overview: read the `Authorization: Bearer <token>` header, verify the
//! token, and resolve its subject to a stored administrator. Every failure
//! collapses into the same 401 so callers cannot tell why they were refused.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::debug;

use crate::{api::handlers::ApiError, security::TokenKeys, store::Session};

pub(crate) const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Administrator on whose behalf a request runs.
#[derive(Clone, Debug)]
pub struct Principal {
    pub admin_id: i64,
    pub username: String,
}

/// Extract the token from an `Authorization` header; the scheme is matched
/// case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the bearer token into a principal, or fail with 401.
///
/// # Errors
/// `Unauthorized` for a missing, malformed, forged or expired token, or one
/// whose subject no longer exists. Storage failures surface as `Internal`.
pub async fn require_admin(
    headers: &HeaderMap,
    keys: &TokenKeys,
    session: &mut dyn Session,
) -> Result<Principal, ApiError> {
    let Some(token) = bearer_token(headers) else {
        debug!("Missing or malformed Authorization header");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    };

    let claims = keys.verify(token).map_err(|err| {
        debug!("Rejected bearer token: {err}");
        ApiError::Unauthorized(INVALID_CREDENTIALS)
    })?;

    match session.admin_by_username(&claims.sub).await? {
        Some(admin) => Ok(Principal {
            admin_id: admin.id,
            username: admin.username,
        }),
        None => {
            debug!("Token subject is not a registered administrator");
            Err(ApiError::Unauthorized(INVALID_CREDENTIALS))
        }
    }
}
