//! Auth configuration and the token keys derived from it.

use jsonwebtoken::Algorithm;
use secrecy::SecretString;

use crate::security::{TokenError, TokenKeys};

const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret_key: SecretString,
    algorithm: Algorithm,
    access_token_expire_minutes: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_access_token_expire_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expire_minutes = minutes;
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn access_token_expire_minutes(&self) -> i64 {
        self.access_token_expire_minutes
    }
}

/// Immutable auth state shared by every request.
#[derive(Debug)]
pub struct AuthState {
    keys: TokenKeys,
}

impl AuthState {
    /// Derive signing keys from `config`.
    ///
    /// # Errors
    /// Returns an error if the secret, algorithm or lifetime is unusable.
    pub fn new(config: AuthConfig) -> Result<Self, TokenError> {
        let keys = TokenKeys::new(
            &config.secret_key,
            config.algorithm,
            config.access_token_expire_minutes,
        )?;
        Ok(Self { keys })
    }

    #[must_use]
    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }
}
