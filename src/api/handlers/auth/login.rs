//! `POST /login`: exchange credentials for a bearer token.

use axum::{
    Form, Json,
    extract::{Extension, rejection::FormRejection},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    AuthState, service,
    types::{LoginForm, TokenResponse},
};
use crate::{api::handlers::ApiError, store::Store};

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
        (status = 422, description = "Missing form fields"),
    ),
    tag = "auth"
)]
#[instrument(skip(store, auth, form))]
pub async fn login(
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(credentials) = form?;
    let mut session = store.session().await?;
    let token = service::login(
        session.as_mut(),
        auth.keys(),
        &credentials.username,
        &credentials.password,
    )
    .await?;
    Ok(Json(token))
}
