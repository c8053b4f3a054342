//! Registration and login flows, independent of HTTP extraction.

use anyhow::anyhow;
use tracing::{debug, info};

use super::types::{AdminResponse, TokenResponse, validate_password, validate_username};
use crate::{
    api::handlers::{ApiError, error::conflict_message},
    security::{TokenKeys, hash_password, verify_password},
    store::{Session, UniqueField},
};

const LOGIN_FAILED: &str = "Incorrect username or password";

/// Create a new administrator.
///
/// # Errors
/// Validation errors for bad input, `Conflict` when the username is taken.
pub async fn register(
    session: &mut dyn Session,
    username: &str,
    password: &str,
) -> Result<AdminResponse, ApiError> {
    let username = validate_username(username)?;
    validate_password(password)?;

    if session.admin_by_username(&username).await?.is_some() {
        debug!("Registration rejected, username exists");
        return Err(ApiError::Conflict(conflict_message(UniqueField::Username)));
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| ApiError::Internal(anyhow!("password hashing task failed: {err}")))?
        .map_err(ApiError::Internal)?;

    // A concurrent registration can still win; the unique constraint reports it.
    let admin = session.insert_admin(&username, &password_hash).await?;
    info!(admin_id = admin.id, "Administrator registered");
    Ok(admin.into())
}

/// Check credentials and issue a bearer token for the administrator.
///
/// # Errors
/// `Unauthorized` when the username is unknown or the password does not match.
pub async fn login(
    session: &mut dyn Session,
    keys: &TokenKeys,
    username: &str,
    password: &str,
) -> Result<TokenResponse, ApiError> {
    let Some(admin) = session.admin_by_username(username.trim()).await? else {
        debug!("Login failed, unknown username");
        return Err(ApiError::Unauthorized(LOGIN_FAILED));
    };

    let password = password.to_string();
    let stored_hash = admin.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|err| ApiError::Internal(anyhow!("password verification task failed: {err}")))?;
    if !verified {
        debug!("Login failed, wrong password");
        return Err(ApiError::Unauthorized(LOGIN_FAILED));
    }

    let token = keys
        .issue(&admin.username)
        .map_err(|err| ApiError::Internal(err.into()))?;
    info!(admin_id = admin.id, "Administrator logged in");
    Ok(TokenResponse::bearer(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;

    fn keys() -> anyhow::Result<TokenKeys> {
        Ok(TokenKeys::new(
            &SecretString::from("test-secret".to_string()),
            Algorithm::HS256,
            30,
        )?)
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_username() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut session = store.session().await?;
        let keys = keys()?;

        let admin = register(session.as_mut(), "admin", "secret1")
            .await
            .map_err(|err| anyhow!("{err:?}"))?;
        assert_eq!(admin.id, 1);
        assert_eq!(admin.username, "admin");

        let token = login(session.as_mut(), &keys, "admin", "secret1")
            .await
            .map_err(|err| anyhow!("{err:?}"))?;
        assert_eq!(token.token_type, "bearer");
        assert_eq!(keys.verify(&token.access_token)?.sub, "admin");
        Ok(())
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_password() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut session = store.session().await?;
        register(session.as_mut(), "admin", "secret1")
            .await
            .map_err(|err| anyhow!("{err:?}"))?;
        let stored = session
            .admin_by_username("admin")
            .await?
            .ok_or_else(|| anyhow!("admin missing"))?;
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$argon2"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut session = store.session().await?;
        register(session.as_mut(), "admin", "secret1")
            .await
            .map_err(|err| anyhow!("{err:?}"))?;
        let result = register(session.as_mut(), "admin", "another1").await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn short_credentials_fail_validation() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut session = store.session().await?;
        assert!(matches!(
            register(session.as_mut(), "ab", "secret1").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            register(session.as_mut(), "admin", "12345").await,
            Err(ApiError::Validation(_))
        ));
        assert!(session.admin_by_username("admin").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut session = store.session().await?;
        let keys = keys()?;
        register(session.as_mut(), "admin", "secret1")
            .await
            .map_err(|err| anyhow!("{err:?}"))?;

        let wrong_password = login(session.as_mut(), &keys, "admin", "wrong-pass").await;
        let unknown_user = login(session.as_mut(), &keys, "nobody", "secret1").await;
        match (wrong_password, unknown_user) {
            (Err(ApiError::Unauthorized(a)), Err(ApiError::Unauthorized(b))) => {
                assert_eq!(a, b);
                assert_eq!(a, LOGIN_FAILED);
            }
            other => panic!("expected two unauthorized errors, got {other:?}"),
        }
        Ok(())
    }
}
