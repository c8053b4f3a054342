//! In-process store used by tests and local development.
//!
//! Mirrors the Postgres constraints: usernames, CNPJ and contact email are
//! unique, ids start at 1 and are never reused.

use async_trait::async_trait;
use chrono::Utc;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::Mutex;

use super::{
    Administrator, Company, CompanyFilter, CompanyPatch, NewCompany, Page, Session, Store,
    StoreError, UniqueField,
};

#[derive(Debug, Default)]
struct Tables {
    admins: BTreeMap<i64, Administrator>,
    companies: BTreeMap<i64, Company>,
    last_admin_id: i64,
    last_company_id: i64,
}

impl Tables {
    fn email_owner(&self, email: &str) -> Option<i64> {
        self.companies
            .values()
            .find(|company| company.contact_email == email)
            .map(|company| company.id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        Ok(Box::new(MemorySession {
            tables: Arc::clone(&self.tables),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemorySession {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl Session for MemorySession {
    async fn admin_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Administrator>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .admins
            .values()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn insert_admin(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<Administrator, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.admins.values().any(|admin| admin.username == username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }

        tables.last_admin_id += 1;
        let admin = Administrator {
            id: tables.last_admin_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn company_by_id(&mut self, id: i64) -> Result<Option<Company>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.companies.get(&id).cloned())
    }

    async fn company_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Company>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .companies
            .values()
            .find(|company| company.tax_id == tax_id)
            .cloned())
    }

    async fn company_by_email(&mut self, email: &str) -> Result<Option<Company>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .email_owner(email)
            .and_then(|id| tables.companies.get(&id))
            .cloned())
    }

    async fn list_companies(
        &mut self,
        filter: &CompanyFilter,
        page: Page,
    ) -> Result<Vec<Company>, StoreError> {
        let tables = self.tables.lock().await;
        let skip = usize::try_from(page.skip).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(tables
            .companies
            .values()
            .filter(|company| {
                matches_filter(&company.city, filter.city.as_deref())
                    && matches_filter(&company.business_sector, filter.business_sector.as_deref())
                    && matches_filter(&company.name, filter.name.as_deref())
            })
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_company(&mut self, company: &NewCompany) -> Result<Company, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .companies
            .values()
            .any(|existing| existing.tax_id == company.tax_id)
        {
            return Err(StoreError::Conflict(UniqueField::TaxId));
        }
        if tables.email_owner(&company.contact_email).is_some() {
            return Err(StoreError::Conflict(UniqueField::ContactEmail));
        }

        tables.last_company_id += 1;
        let record = Company {
            id: tables.last_company_id,
            name: company.name.clone(),
            tax_id: company.tax_id.clone(),
            city: company.city.clone(),
            business_sector: company.business_sector.clone(),
            phone: company.phone.clone(),
            contact_email: company.contact_email.clone(),
            registered_at: Utc::now(),
        };
        tables.companies.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_company(
        &mut self,
        id: i64,
        patch: &CompanyPatch,
    ) -> Result<Option<Company>, StoreError> {
        let mut tables = self.tables.lock().await;
        let email_taken = patch
            .contact_email
            .as_deref()
            .and_then(|email| tables.email_owner(email))
            .is_some_and(|owner| owner != id);
        if email_taken {
            return Err(StoreError::Conflict(UniqueField::ContactEmail));
        }

        let Some(company) = tables.companies.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            company.name.clone_from(name);
        }
        if let Some(city) = &patch.city {
            company.city.clone_from(city);
        }
        if let Some(sector) = &patch.business_sector {
            company.business_sector.clone_from(sector);
        }
        if let Some(phone) = &patch.phone {
            company.phone.clone_from(phone);
        }
        if let Some(email) = &patch.contact_email {
            company.contact_email.clone_from(email);
        }
        Ok(Some(company.clone()))
    }

    async fn delete_company(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.companies.remove(&id).is_some())
    }
}

fn matches_filter(value: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| value.to_lowercase().contains(&needle.to_lowercase()))
}
