//! Error taxonomy surfaced to API callers.
//!
//! Every failure becomes one of five variants with a fixed status code and a
//! short `{"detail": ...}` body. Internal causes are logged, never returned.

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::store::{StoreError, UniqueField};

#[derive(Debug)]
pub enum ApiError {
    /// Malformed input, rejected before any business logic runs.
    Validation(String),
    Conflict(&'static str),
    NotFound(&'static str),
    Unauthorized(&'static str),
    Internal(anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(message) => (status, Json(json!({ "detail": message }))).into_response(),
            Self::Conflict(message) | Self::NotFound(message) => {
                (status, Json(json!({ "detail": message }))).into_response()
            }
            Self::Unauthorized(message) => (
                status,
                [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
                Json(json!({ "detail": message })),
            )
                .into_response(),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                (status, Json(json!({ "detail": "Internal server error" }))).into_response()
            }
        }
    }
}

/// Message used when a storage constraint rejects a write.
#[must_use]
pub const fn conflict_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already registered.",
        UniqueField::TaxId => "CNPJ already registered.",
        UniqueField::ContactEmail => "Contact email already registered.",
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => Self::Conflict(conflict_message(field)),
            StoreError::Database(err) => Self::Internal(err.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
