//! Command-line argument dispatch.
//!
//! This module maps validated CLI arguments to the action to run, such as
//! starting the API server with its full configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_MAX_CONNECTIONS, ARG_PORT, auth};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let max_connections = matches
        .get_one::<u32>(ARG_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        max_connections,
        secret_key: auth_opts.secret_key,
        algorithm: auth_opts.algorithm,
        access_token_expire_minutes: auth_opts.access_token_expire_minutes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    #[test]
    fn server_action_from_env() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://user@localhost:5432/empresas")),
                ("SECRET_KEY", Some("s3cret")),
                ("EMPRESAS_PORT", Some("3000")),
                ("ALGORITHM", Some("hs384")),
                ("ACCESS_TOKEN_EXPIRE_MINUTES", None),
                ("EMPRESAS_DB_MAX_CONNECTIONS", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["empresas"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 3000);
                    assert_eq!(args.max_connections, 5);
                    assert_eq!(args.algorithm, Algorithm::HS384);
                    assert_eq!(args.access_token_expire_minutes, 30);
                }
            },
        );
    }

    #[test]
    fn unsupported_algorithm_is_reported() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://user@localhost:5432/empresas")),
                ("SECRET_KEY", Some("s3cret")),
                ("ALGORITHM", Some("none")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["empresas"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("invalid --algorithm"));
                }
            },
        );
    }
}
