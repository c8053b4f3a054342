//! Signed, time-limited bearer tokens.
//!
//! Tokens are JWTs signed with a shared HMAC secret. The subject claim is the
//! administrator username; `exp` is mandatory and checked without leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("token lifetime must be at least one minute")]
    InvalidLifetime,
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Parse an algorithm name such as `HS256`. Only HMAC algorithms are accepted
/// because tokens are signed with a shared secret.
///
/// # Errors
/// Returns [`TokenError::UnsupportedAlgorithm`] for unknown or asymmetric algorithms.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    let normalized = name.trim().to_ascii_uppercase();
    Algorithm::from_str(&normalized)
        .ok()
        .filter(|algorithm| HMAC_ALGORITHMS.contains(algorithm))
        .ok_or_else(|| TokenError::UnsupportedAlgorithm(name.to_string()))
}

/// Issues and verifies tokens with one secret, algorithm and lifetime.
pub struct TokenKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &self.algorithm)
            .field("lifetime_minutes", &self.lifetime.num_minutes())
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Build keys from the signing secret.
    ///
    /// # Errors
    /// Returns an error if the secret is empty, the algorithm is not HMAC, or
    /// the lifetime is not positive.
    pub fn new(
        secret: &SecretString,
        algorithm: Algorithm,
        lifetime_minutes: i64,
    ) -> Result<Self, TokenError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if !HMAC_ALGORITHMS.contains(&algorithm) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }
        if lifetime_minutes < 1 {
            return Err(TokenError::InvalidLifetime);
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime: Duration::minutes(lifetime_minutes),
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `subject`, valid for the configured lifetime.
    ///
    /// # Errors
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Verify signature, algorithm and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn keys(secret: &str) -> Result<TokenKeys, TokenError> {
        TokenKeys::new(&SecretString::from(secret.to_string()), Algorithm::HS256, 30)
    }

    #[test]
    fn issued_token_round_trips_subject() -> Result<(), TokenError> {
        let keys = keys("test-secret")?;
        let token = keys.issue("admin")?;
        let claims = keys.verify(&token)?;
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<(), TokenError> {
        let keys = keys("test-secret")?;
        let token = keys.issue_at("admin", Utc::now() - Duration::minutes(31))?;
        match keys.verify(&token) {
            Err(TokenError::Invalid(err)) => {
                assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
            }
            other => panic!("expected expired signature, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> Result<(), TokenError> {
        let issuer = keys("secret-one")?;
        let verifier = keys("secret-two")?;
        let token = issuer.issue("admin")?;
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() -> Result<(), TokenError> {
        let keys = keys("test-secret")?;
        assert!(keys.verify("invalid.token.here").is_err());
        assert!(keys.verify("").is_err());
        Ok(())
    }

    #[test]
    fn token_with_other_algorithm_is_rejected() -> Result<(), TokenError> {
        let secret = SecretString::from("test-secret".to_string());
        let hs512 = TokenKeys::new(&secret, Algorithm::HS512, 30)?;
        let hs256 = TokenKeys::new(&secret, Algorithm::HS256, 30)?;
        let token = hs512.issue("admin")?;
        assert!(hs256.verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn parse_algorithm_accepts_hmac_only() {
        assert_eq!(parse_algorithm("HS256").ok(), Some(Algorithm::HS256));
        assert_eq!(parse_algorithm("hs384").ok(), Some(Algorithm::HS384));
        assert_eq!(parse_algorithm(" HS512 ").ok(), Some(Algorithm::HS512));
        assert!(matches!(
            parse_algorithm("RS256"),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let empty = SecretString::from(String::new());
        assert!(matches!(
            TokenKeys::new(&empty, Algorithm::HS256, 30),
            Err(TokenError::EmptySecret)
        ));
        let secret = SecretString::from("s".to_string());
        assert!(matches!(
            TokenKeys::new(&secret, Algorithm::HS256, 0),
            Err(TokenError::InvalidLifetime)
        ));
        assert!(matches!(
            TokenKeys::new(&secret, Algorithm::RS256, 30),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }
}
