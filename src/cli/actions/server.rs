use crate::{api, api::handlers::auth::AuthConfig, cli::telemetry};
use anyhow::Result;
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use std::fmt;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub max_connections: u32,
    pub secret_key: SecretString,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &api::redact_dsn(&self.dsn))
            .field("max_connections", &self.max_connections)
            .field("secret_key", &self.secret_key)
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .finish()
    }
}

impl Args {
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.secret_key.clone())
            .with_algorithm(self.algorithm)
            .with_access_token_expire_minutes(self.access_token_expire_minutes)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = args.auth_config();
    debug!(
        algorithm = ?auth_config.algorithm(),
        access_token_expire_minutes = auth_config.access_token_expire_minutes(),
        "Token configuration"
    );

    let result = api::new(args.port, args.dsn, args.max_connections, auth_config).await;

    telemetry::shutdown_tracer();

    result
}
