//! `POST /register`: create an administrator account.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service,
    types::{AdminResponse, RegisterRequest},
};
use crate::{api::handlers::ApiError, store::Store};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Administrator created", body = AdminResponse),
        (status = 409, description = "Username already registered"),
        (status = 422, description = "Invalid username or password"),
    ),
    tag = "auth"
)]
#[instrument(skip(store, payload))]
pub async fn register(
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AdminResponse>), ApiError> {
    let Json(request) = payload?;
    let mut session = store.session().await?;
    let admin = service::register(session.as_mut(), &request.username, &request.password).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}
