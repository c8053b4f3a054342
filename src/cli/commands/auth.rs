//! Token signing options.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use jsonwebtoken::Algorithm;
use secrecy::SecretString;

use crate::security::parse_algorithm;

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_ALGORITHM: &str = "algorithm";
pub const ARG_ACCESS_TOKEN_EXPIRE_MINUTES: &str = "access-token-expire-minutes";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Secret used to sign bearer tokens")
                .env("SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ALGORITHM)
                .long(ARG_ALGORITHM)
                .help("Token signing algorithm: HS256, HS384 or HS512")
                .env("ALGORITHM")
                .default_value("HS256"),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
                .long(ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
                .help("Bearer token lifetime in minutes")
                .env("ACCESS_TOKEN_EXPIRE_MINUTES")
                .default_value("30")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub secret_key: SecretString,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

impl Options {
    /// # Errors
    /// Returns an error if the secret is missing or the algorithm is not HMAC.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret_key = matches
            .get_one::<String>(ARG_SECRET_KEY)
            .cloned()
            .context("missing required argument: --secret-key")?;
        let algorithm = matches
            .get_one::<String>(ARG_ALGORITHM)
            .map_or(Ok(Algorithm::HS256), |name| parse_algorithm(name))
            .context("invalid --algorithm")?;
        let access_token_expire_minutes = matches
            .get_one::<i64>(ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
            .copied()
            .unwrap_or(30);

        Ok(Self {
            secret_key: SecretString::from(secret_key),
            algorithm,
            access_token_expire_minutes,
        })
    }
}
