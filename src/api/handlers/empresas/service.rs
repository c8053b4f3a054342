//! Company flows on top of a storage session.
//!
//! Duplicate checks here give precise messages; the storage constraints still
//! decide races, and their conflicts map to the same 409.

use tracing::{debug, info};

use super::types::{CompanyResponse, CreateCompanyRequest, ListCompaniesQuery, UpdateCompanyRequest};
use crate::{
    api::handlers::{ApiError, error::conflict_message},
    store::{Session, StoreError, UniqueField},
};

const COMPANY_NOT_FOUND: &str = "Company not found.";
const EMAIL_TAKEN_ON_UPDATE: &str = "Contact email already registered to another company.";

/// # Errors
/// Validation for bad fields, `Conflict` for a taken CNPJ or contact email.
pub async fn create(
    session: &mut dyn Session,
    request: CreateCompanyRequest,
) -> Result<CompanyResponse, ApiError> {
    let company = request.validate()?;

    if session.company_by_tax_id(&company.tax_id).await?.is_some() {
        return Err(ApiError::Conflict(conflict_message(UniqueField::TaxId)));
    }
    if session.company_by_email(&company.contact_email).await?.is_some() {
        return Err(ApiError::Conflict(conflict_message(UniqueField::ContactEmail)));
    }

    let created = session.insert_company(&company).await?;
    info!(company_id = created.id, "Company created");
    Ok(created.into())
}

/// # Errors
/// Storage failures only.
pub async fn list(
    session: &mut dyn Session,
    query: ListCompaniesQuery,
) -> Result<Vec<CompanyResponse>, ApiError> {
    let (filter, page) = query.into_parts();
    let companies = session.list_companies(&filter, page).await?;
    debug!(count = companies.len(), "Listed companies");
    Ok(companies.into_iter().map(CompanyResponse::from).collect())
}

/// # Errors
/// `NotFound` when no company has `id`.
pub async fn get(session: &mut dyn Session, id: i64) -> Result<CompanyResponse, ApiError> {
    session
        .company_by_id(id)
        .await?
        .map(CompanyResponse::from)
        .ok_or(ApiError::NotFound(COMPANY_NOT_FOUND))
}

/// Apply a partial update; fields not supplied keep their values. An empty
/// update returns the stored company unchanged.
///
/// # Errors
/// `NotFound` for an unknown id, `Conflict` when the new contact email belongs
/// to another company, validation errors for bad fields.
pub async fn update(
    session: &mut dyn Session,
    id: i64,
    request: UpdateCompanyRequest,
) -> Result<CompanyResponse, ApiError> {
    let patch = request.validate()?;

    let Some(current) = session.company_by_id(id).await? else {
        return Err(ApiError::NotFound(COMPANY_NOT_FOUND));
    };
    if patch.is_empty() {
        debug!(company_id = id, "Empty update, nothing to change");
        return Ok(current.into());
    }
    if let Some(email) = patch.contact_email.as_deref() {
        let owner = session.company_by_email(email).await?;
        if owner.is_some_and(|owner| owner.id != id) {
            return Err(ApiError::Conflict(EMAIL_TAKEN_ON_UPDATE));
        }
    }

    match session.update_company(id, &patch).await {
        Ok(Some(company)) => {
            info!(company_id = id, "Company updated");
            Ok(company.into())
        }
        Ok(None) => Err(ApiError::NotFound(COMPANY_NOT_FOUND)),
        Err(StoreError::Conflict(UniqueField::ContactEmail)) => {
            Err(ApiError::Conflict(EMAIL_TAKEN_ON_UPDATE))
        }
        Err(err) => Err(err.into()),
    }
}

/// # Errors
/// `NotFound` when no company has `id`.
pub async fn delete(session: &mut dyn Session, id: i64) -> Result<(), ApiError> {
    if session.delete_company(id).await? {
        info!(company_id = id, "Company deleted");
        Ok(())
    } else {
        Err(ApiError::NotFound(COMPANY_NOT_FOUND))
    }
}
