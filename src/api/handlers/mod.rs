//! API handlers and shared input checks.
//!
//! Each resource keeps its handlers, request/response types and flow logic in
//! its own module; the helpers below are the field rules they have in common.

pub mod auth;
pub mod empresas;
pub mod error;
pub mod health;
pub mod root;

pub use error::ApiError;

use regex::Regex;

/// Lightweight email sanity check: `local@domain.tld`, no whitespace.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Emails are compared and stored trimmed and lowercased, local part
/// included. Contact emails are unique case-insensitively: `Ana@acme.com`
/// and `ana@acme.com` belong to the same company.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject blank values; return the trimmed value otherwise.
///
/// # Errors
/// Returns a validation error naming `field` when `value` is blank.
pub fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Enforce a minimum length in characters on the trimmed value.
///
/// # Errors
/// Returns a validation error naming `field` when the value is too short.
pub fn min_chars(field: &str, value: &str, min: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min {
        return Err(ApiError::Validation(format!(
            "{field} must have at least {min} characters"
        )));
    }
    Ok(trimmed.to_string())
}
