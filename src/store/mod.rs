//! Persistence for administrators and companies.
//!
//! A [`Store`] hands out one [`Session`] per request. Sessions own whatever
//! backend resource they need (a pooled Postgres connection, or a handle to
//! the in-memory tables) and release it when dropped, so a session never
//! outlives the request that opened it.
//!
//! Uniqueness (usernames, CNPJ, contact email) is enforced here and reported
//! as [`StoreError::Conflict`]. Callers may pre-check for duplicates, but the
//! store is the authoritative guard.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Default page size for company listings.
pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Administrator {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub tax_id: String,
    pub city: String,
    pub business_sector: String,
    pub phone: String,
    pub contact_email: String,
    pub registered_at: DateTime<Utc>,
}

/// Validated input for a new company row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub tax_id: String,
    pub city: String,
    pub business_sector: String,
    pub phone: String,
    pub contact_email: String,
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub business_sector: Option<String>,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
}

impl CompanyPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.city.is_none()
            && self.business_sector.is_none()
            && self.phone.is_none()
            && self.contact_email.is_none()
    }
}

/// Case-insensitive substring filters; all supplied filters must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub city: Option<String>,
    pub business_sector: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Column guarded by a unique constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    TaxId,
    ContactEmail,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Username => "username",
            Self::TaxId => "cnpj",
            Self::ContactEmail => "email_contato",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    Conflict(UniqueField),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a session scoped to a single request.
    async fn session(&self) -> Result<Box<dyn Session>, StoreError>;

    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Session: Send {
    async fn admin_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Administrator>, StoreError>;

    async fn insert_admin(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<Administrator, StoreError>;

    async fn company_by_id(&mut self, id: i64) -> Result<Option<Company>, StoreError>;

    async fn company_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Company>, StoreError>;

    async fn company_by_email(&mut self, email: &str) -> Result<Option<Company>, StoreError>;

    async fn list_companies(
        &mut self,
        filter: &CompanyFilter,
        page: Page,
    ) -> Result<Vec<Company>, StoreError>;

    async fn insert_company(&mut self, company: &NewCompany) -> Result<Company, StoreError>;

    /// Returns `None` when no company has `id`.
    async fn update_company(
        &mut self,
        id: i64,
        patch: &CompanyPatch,
    ) -> Result<Option<Company>, StoreError>;

    /// Returns `false` when no company has `id`.
    async fn delete_company(&mut self, id: i64) -> Result<bool, StoreError>;
}
