//! Database connection management

use std::str::FromStr;

use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::tenants::records::TenantUuid;

/// SQL used to set tenant context for row-level security.
pub const SET_TENANT_CONTEXT_SQL: &str = "SELECT set_config('app.current_tenant_uuid', $1, true)";

const CURRENT_ROLE_FLAGS_SQL: &str =
    "SELECT rolname, rolsuper, rolbypassrls FROM pg_roles WHERE rolname = current_user";

/// Handle to the connection pool.
#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction without tenant context.
    ///
    /// Only credential lookups (API keys, portal tokens, tenants) run here; every
    /// tenant-owned table is hidden by RLS until a tenant is set.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Begin a transaction and set tenant context for RLS policies.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting tenant context fails.
    pub async fn begin_tenant_transaction(
        &self,
        tenant: TenantUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        set_tenant_context(&mut tx, tenant).await?;

        Ok(tx)
    }
}

/// Switch an open transaction to the given tenant's RLS context.
///
/// # Errors
///
/// Returns an error when the `set_config` call fails.
pub async fn set_tenant_context(
    tx: &mut Transaction<'_, Postgres>,
    tenant: TenantUuid,
) -> Result<(), sqlx::Error> {
    query(SET_TENANT_CONTEXT_SQL)
        .bind(tenant.into_uuid().to_string())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Refuse to run as a role that silently bypasses row-level security.
///
/// # Errors
///
/// Returns a configuration error when the connected role is a superuser or has
/// `BYPASSRLS`, or a query error if the role flags cannot be read.
pub async fn ensure_rls_enforced_role(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (role, superuser, bypass_rls): (String, bool, bool) =
        query_as(CURRENT_ROLE_FLAGS_SQL).fetch_one(pool).await?;

    if superuser || bypass_rls {
        return Err(sqlx::Error::Configuration(
            format!(
                "database role `{role}` bypasses row-level security; \
                 run `portal-app db ensure-app-role` and connect as that role"
            )
            .into(),
        ));
    }

    Ok(())
}

/// Decode a text column through the target type's [`FromStr`](std::str::FromStr).
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    row.try_get::<String, _>(column)?
        .parse::<T>()
        .map_err(|error| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(error),
        })
}

/// Decode a non-negative integer column into `u32`.
pub(crate) fn u32_column(row: &PgRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    })
}

/// Bind a `u32` into an `INTEGER` column, saturating at `i32::MAX`.
pub(crate) fn i32_param(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
