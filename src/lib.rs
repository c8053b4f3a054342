//! # Empresas (client company registry)
//!
//! `empresas` is a small REST service that keeps a registry of client
//! companies. Administrators register and log in to obtain a bearer token;
//! every company endpoint requires that token.
//!
//! ## Layout
//!
//! - [`api`]: axum router, handlers and the `OpenAPI` document.
//! - [`security`]: Argon2 password hashing and JWT issue/verify.
//! - [`store`]: storage traits with Postgres and in-memory backends.
//! - [`cli`]: argument parsing, telemetry setup and the server action.
//!
//! ## Companies
//!
//! A company is identified by its CNPJ (14 digits), which is unique and never
//! changes after creation. The contact email is unique as well. Listing
//! supports case-insensitive substring filters on city, business sector and
//! name, combined with AND, plus `skip`/`limit` pagination.

pub mod api;
pub mod cli;
pub mod security;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
