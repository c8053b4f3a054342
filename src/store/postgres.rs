//! Postgres-backed store.
//!
//! Each session holds one pooled connection for the lifetime of a request;
//! dropping the session returns the connection to the pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    Connection, PgPool, Postgres, Row,
    pool::PoolConnection,
    postgres::{PgPoolOptions, PgRow},
};
use std::time::Duration;
use tracing::{Instrument, Span, info, info_span};

use super::{
    Administrator, Company, CompanyFilter, CompanyPatch, NewCompany, Page, Session, Store,
    StoreError, UniqueField,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for schema setup")?;

        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Failed to execute schema statement {}", index + 1))?;
        }

        info!("Database schema is up to date");

        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let conn = self.pool.acquire().instrument(acquire_span).await?;
        Ok(Box::new(PgSession { conn }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }
}

struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Session for PgSession {
    async fn admin_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Administrator>, StoreError> {
        let query = "SELECT id, username, hashed_password FROM usuarios WHERE username = $1";
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .instrument(db_span("SELECT", query))
            .await?;
        row.as_ref().map(admin_from_row).transpose().map_err(Into::into)
    }

    async fn insert_admin(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<Administrator, StoreError> {
        let query = r"
            INSERT INTO usuarios (username, hashed_password)
            VALUES ($1, $2)
            RETURNING id, username, hashed_password
        ";
        let row = sqlx::query(query)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&mut *self.conn)
            .instrument(db_span("INSERT", query))
            .await
            .map_err(map_write_error)?;
        Ok(admin_from_row(&row)?)
    }

    async fn company_by_id(&mut self, id: i64) -> Result<Option<Company>, StoreError> {
        let query = r"
            SELECT id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
            FROM empresas
            WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .instrument(db_span("SELECT", query))
            .await?;
        row.as_ref().map(company_from_row).transpose().map_err(Into::into)
    }

    async fn company_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Company>, StoreError> {
        let query = r"
            SELECT id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
            FROM empresas
            WHERE cnpj = $1
        ";
        let row = sqlx::query(query)
            .bind(tax_id)
            .fetch_optional(&mut *self.conn)
            .instrument(db_span("SELECT", query))
            .await?;
        row.as_ref().map(company_from_row).transpose().map_err(Into::into)
    }

    async fn company_by_email(&mut self, email: &str) -> Result<Option<Company>, StoreError> {
        let query = r"
            SELECT id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
            FROM empresas
            WHERE email_contato = $1
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&mut *self.conn)
            .instrument(db_span("SELECT", query))
            .await?;
        row.as_ref().map(company_from_row).transpose().map_err(Into::into)
    }

    async fn list_companies(
        &mut self,
        filter: &CompanyFilter,
        page: Page,
    ) -> Result<Vec<Company>, StoreError> {
        let query = r"
            SELECT id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
            FROM empresas
            WHERE ($1::text IS NULL OR cidade ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR ramo_atuacao ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR nome ILIKE $3 ESCAPE '\')
            ORDER BY id
            OFFSET $4
            LIMIT $5
        ";
        let rows = sqlx::query(query)
            .bind(filter.city.as_deref().map(like_pattern))
            .bind(filter.business_sector.as_deref().map(like_pattern))
            .bind(filter.name.as_deref().map(like_pattern))
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&mut *self.conn)
            .instrument(db_span("SELECT", query))
            .await?;
        rows.iter()
            .map(company_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn insert_company(&mut self, company: &NewCompany) -> Result<Company, StoreError> {
        let query = r"
            INSERT INTO empresas (nome, cnpj, cidade, ramo_atuacao, telefone, email_contato)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
        ";
        let row = sqlx::query(query)
            .bind(&company.name)
            .bind(&company.tax_id)
            .bind(&company.city)
            .bind(&company.business_sector)
            .bind(&company.phone)
            .bind(&company.contact_email)
            .fetch_one(&mut *self.conn)
            .instrument(db_span("INSERT", query))
            .await
            .map_err(map_write_error)?;
        Ok(company_from_row(&row)?)
    }

    async fn update_company(
        &mut self,
        id: i64,
        patch: &CompanyPatch,
    ) -> Result<Option<Company>, StoreError> {
        let query = r"
            UPDATE empresas
            SET
                nome = COALESCE($1, nome),
                cidade = COALESCE($2, cidade),
                ramo_atuacao = COALESCE($3, ramo_atuacao),
                telefone = COALESCE($4, telefone),
                email_contato = COALESCE($5, email_contato)
            WHERE id = $6
            RETURNING id, nome, cnpj, cidade, ramo_atuacao, telefone, email_contato, data_cadastro
        ";
        let row = sqlx::query(query)
            .bind(patch.name.as_deref())
            .bind(patch.city.as_deref())
            .bind(patch.business_sector.as_deref())
            .bind(patch.phone.as_deref())
            .bind(patch.contact_email.as_deref())
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .instrument(db_span("UPDATE", query))
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(company_from_row).transpose().map_err(Into::into)
    }

    async fn delete_company(&mut self, id: i64) -> Result<bool, StoreError> {
        let query = "DELETE FROM empresas WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&mut *self.conn)
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn db_span(operation: &'static str, statement: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement.trim()
    )
}

fn admin_from_row(row: &PgRow) -> Result<Administrator, sqlx::Error> {
    Ok(Administrator {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("hashed_password")?,
    })
}

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("nome")?,
        tax_id: row.try_get("cnpj")?,
        city: row.try_get("cidade")?,
        business_sector: row.try_get("ramo_atuacao")?,
        phone: row.try_get("telefone")?,
        contact_email: row.try_get("email_contato")?,
        registered_at: row.try_get("data_cadastro")?,
    })
}

/// Map a unique-constraint violation to the column it guards.
fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }
    match db_err.constraint() {
        Some("usuarios_username_key") => Some(UniqueField::Username),
        Some("empresas_cnpj_key") => Some(UniqueField::TaxId),
        Some("empresas_email_contato_key") => Some(UniqueField::ContactEmail),
        _ => None,
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match unique_violation(&err) {
        Some(field) => StoreError::Conflict(field),
        None => StoreError::Database(err),
    }
}

/// Wrap `value` in `%…%`, escaping LIKE metacharacters so they match literally.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Split the schema file into statements. Statements end with `;` at end of line.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}
