//! Handlers for `/empresas/` and `/empresas/{id}`.
//!
//! Extractor rejections are held back until the bearer token has been
//! checked, so a request without credentials always gets 401.

use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    service,
    types::{CompanyResponse, CreateCompanyRequest, ListCompaniesQuery, UpdateCompanyRequest},
};
use crate::{
    api::handlers::{
        ApiError,
        auth::{AuthState, require_admin},
    },
    store::Store,
};

#[utoipa::path(
    post,
    path = "/empresas/",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "CNPJ or contact email already registered"),
        (status = 422, description = "Invalid company fields"),
    ),
    security(("bearer" = [])),
    tag = "empresas"
)]
#[instrument(skip_all)]
pub async fn create_company(
    headers: HeaderMap,
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    payload: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    let mut session = store.session().await?;
    let principal = require_admin(&headers, auth.keys(), session.as_mut()).await?;
    debug!(admin_id = principal.admin_id, admin = %principal.username, "Creating company");

    let Json(request) = payload?;
    let company = service::create(session.as_mut(), request).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/empresas/",
    params(ListCompaniesQuery),
    responses(
        (status = 200, description = "Companies matching every supplied filter", body = [CompanyResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 422, description = "Invalid query parameters"),
    ),
    security(("bearer" = [])),
    tag = "empresas"
)]
#[instrument(skip_all)]
pub async fn list_companies(
    headers: HeaderMap,
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    query: Result<Query<ListCompaniesQuery>, QueryRejection>,
) -> Result<Json<Vec<CompanyResponse>>, ApiError> {
    let mut session = store.session().await?;
    require_admin(&headers, auth.keys(), session.as_mut()).await?;

    let Query(query) = query?;
    let companies = service::list(session.as_mut(), query).await?;
    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/empresas/{id}",
    params(("id" = i64, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company found", body = CompanyResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Company not found"),
    ),
    security(("bearer" = [])),
    tag = "empresas"
)]
#[instrument(skip_all)]
pub async fn get_company(
    headers: HeaderMap,
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let mut session = store.session().await?;
    require_admin(&headers, auth.keys(), session.as_mut()).await?;

    let Path(id) = id?;
    let company = service::get(session.as_mut(), id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/empresas/{id}",
    params(("id" = i64, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Company not found"),
        (status = 409, description = "Contact email belongs to another company"),
        (status = 422, description = "Invalid field in the update"),
    ),
    security(("bearer" = [])),
    tag = "empresas"
)]
#[instrument(skip_all)]
pub async fn update_company(
    headers: HeaderMap,
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let mut session = store.session().await?;
    let principal = require_admin(&headers, auth.keys(), session.as_mut()).await?;

    let Path(id) = id?;
    let Json(request) = payload?;
    debug!(
        admin_id = principal.admin_id,
        admin = %principal.username,
        company_id = id,
        "Updating company"
    );
    let company = service::update(session.as_mut(), id, request).await?;
    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/empresas/{id}",
    params(("id" = i64, Path, description = "Company id")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Company not found"),
    ),
    security(("bearer" = [])),
    tag = "empresas"
)]
#[instrument(skip_all)]
pub async fn delete_company(
    headers: HeaderMap,
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(auth): Extension<Arc<AuthState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let mut session = store.session().await?;
    let principal = require_admin(&headers, auth.keys(), session.as_mut()).await?;

    let Path(id) = id?;
    debug!(
        admin_id = principal.admin_id,
        admin = %principal.username,
        company_id = id,
        "Deleting company"
    );
    service::delete(session.as_mut(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
