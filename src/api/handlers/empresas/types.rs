use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{NAME_MIN, valid_tax_id};
use crate::{
    api::handlers::{ApiError, min_chars, normalize_email, required_text, valid_email},
    store::{Company, CompanyFilter, CompanyPatch, DEFAULT_LIMIT, NewCompany, Page},
};

#[derive(Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    #[schema(min_length = 3, example = "Acme")]
    pub nome: String,
    #[schema(min_length = 14, max_length = 14, example = "12345678000195")]
    pub cnpj: String,
    #[schema(example = "São Paulo")]
    pub cidade: String,
    #[schema(example = "Tecnologia")]
    pub ramo_atuacao: String,
    #[schema(example = "+55 11 4000-0000")]
    pub telefone: String,
    #[schema(example = "contato@acme.com")]
    pub email_contato: String,
}

impl CreateCompanyRequest {
    /// Check every field and produce the row to insert.
    ///
    /// # Errors
    /// Returns a validation error for the first field that fails its rule.
    pub fn validate(self) -> Result<NewCompany, ApiError> {
        let name = min_chars("nome", &self.nome, NAME_MIN)?;
        let tax_id = self.cnpj.trim().to_string();
        if !valid_tax_id(&tax_id) {
            return Err(ApiError::Validation(
                "cnpj must contain exactly 14 digits".to_string(),
            ));
        }
        Ok(NewCompany {
            name,
            tax_id,
            city: required_text("cidade", &self.cidade)?,
            business_sector: required_text("ramo_atuacao", &self.ramo_atuacao)?,
            phone: required_text("telefone", &self.telefone)?,
            contact_email: contact_email(&self.email_contato)?,
        })
    }
}

/// Partial update. The CNPJ is immutable and has no field here; a `cnpj` key
/// in the body is ignored.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateCompanyRequest {
    pub nome: Option<String>,
    pub cidade: Option<String>,
    pub ramo_atuacao: Option<String>,
    pub telefone: Option<String>,
    pub email_contato: Option<String>,
}

impl UpdateCompanyRequest {
    /// Validate the supplied fields; absent fields stay untouched.
    ///
    /// # Errors
    /// Returns a validation error for an invalid field.
    pub fn validate(self) -> Result<CompanyPatch, ApiError> {
        Ok(CompanyPatch {
            name: self
                .nome
                .map(|name| min_chars("nome", &name, NAME_MIN))
                .transpose()?,
            city: self
                .cidade
                .map(|city| required_text("cidade", &city))
                .transpose()?,
            business_sector: self
                .ramo_atuacao
                .map(|sector| required_text("ramo_atuacao", &sector))
                .transpose()?,
            phone: self
                .telefone
                .map(|phone| required_text("telefone", &phone))
                .transpose()?,
            contact_email: self
                .email_contato
                .map(|email| contact_email(&email))
                .transpose()?,
        })
    }
}

fn contact_email(value: &str) -> Result<String, ApiError> {
    let email = normalize_email(value);
    if !valid_email(&email) {
        return Err(ApiError::Validation(
            "email_contato must be a valid email address".to_string(),
        ));
    }
    Ok(email)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompanyResponse {
    pub id: i64,
    pub nome: String,
    pub cnpj: String,
    pub cidade: String,
    pub ramo_atuacao: String,
    pub telefone: String,
    pub email_contato: String,
    pub data_cadastro: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            nome: company.name,
            cnpj: company.tax_id,
            cidade: company.city,
            ramo_atuacao: company.business_sector,
            telefone: company.phone,
            email_contato: company.contact_email,
            data_cadastro: company.registered_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCompaniesQuery {
    /// Case-insensitive substring of the city.
    pub cidade: Option<String>,
    /// Case-insensitive substring of the business sector.
    pub ramo_atuacao: Option<String>,
    /// Case-insensitive substring of the company name.
    pub nome: Option<String>,
    /// Rows to skip, default 0.
    pub skip: Option<u32>,
    /// Maximum rows to return, default 100.
    pub limit: Option<u32>,
}

impl ListCompaniesQuery {
    /// Blank filters are treated as absent.
    #[must_use]
    pub fn into_parts(self) -> (CompanyFilter, Page) {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let filter = CompanyFilter {
            city: clean(self.cidade),
            business_sector: clean(self.ramo_atuacao),
            name: clean(self.nome),
        };
        let page = Page {
            skip: self.skip.map_or(0, i64::from),
            limit: self.limit.map_or(DEFAULT_LIMIT, i64::from),
        };
        (filter, page)
    }
}
