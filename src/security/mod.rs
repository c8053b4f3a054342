//! Credential primitives: Argon2id password hashing and HMAC-signed bearer tokens.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenKeys, parse_algorithm};
