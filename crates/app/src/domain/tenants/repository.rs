//! Tenants Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::{i32_param, parse_column, u32_column},
    domain::tenants::{
        data::{NewTenant, SubscriptionUpdate},
        records::{TenantRecord, TenantUuid},
    },
};

const CREATE_TENANT_SQL: &str = include_str!("sql/create_tenant.sql");
const GET_TENANT_SQL: &str = include_str!("sql/get_tenant.sql");
const LOCK_TENANT_SQL: &str = include_str!("sql/lock_tenant.sql");
const FIND_TENANT_BY_SUBSCRIPTION_SQL: &str = include_str!("sql/find_tenant_by_subscription.sql");
const FIND_TENANT_BY_CUSTOMER_SQL: &str = include_str!("sql/find_tenant_by_customer.sql");
const UPDATE_SUBSCRIPTION_SQL: &str = include_str!("sql/update_subscription.sql");
const COUNT_ACTIVE_ARTISANS_SQL: &str = include_str!("sql/count_active_artisans.sql");

/// PostgreSQL-backed tenants repository.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgTenantsRepository;

impl PgTenantsRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: NewTenant,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(CREATE_TENANT_SQL)
            .bind(tenant.uuid.into_uuid())
            .bind(tenant.name)
            .bind(tenant.email)
            .bind(tenant.subscription_status.as_str())
            .bind(tenant.subscription_plan.as_str())
            .bind(i32_param(tenant.allowed_artisans))
            .bind(tenant.is_active)
            .bind(tenant.stripe_customer_id)
            .bind(tenant.stripe_subscription_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(GET_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Load a tenant and hold its row lock until the transaction ends.
    ///
    /// Serialises quota checks for concurrent token issues.
    pub(crate) async fn lock_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(LOCK_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_tenant_by_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subscription_id: &str,
    ) -> Result<Option<TenantRecord>, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(FIND_TENANT_BY_SUBSCRIPTION_SQL)
            .bind(subscription_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Most recent tenant billed to a billing customer.
    pub(crate) async fn find_tenant_by_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: &str,
    ) -> Result<Option<TenantRecord>, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(FIND_TENANT_BY_CUSTOMER_SQL)
            .bind(customer_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        update: SubscriptionUpdate,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(UPDATE_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .bind(update.status.as_str())
            .bind(update.allowance.map(|allowance| allowance.plan.as_str()))
            .bind(
                update
                    .allowance
                    .map(|allowance| i32_param(allowance.allowed_artisans)),
            )
            .fetch_one(&mut **tx)
            .await
    }

    /// Distinct artisans currently holding an active portal token.
    pub(crate) async fn count_active_artisans(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u32, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_ACTIVE_ARTISANS_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u32::try_from(count).map_err(|error| sqlx::Error::ColumnDecode {
            index: "count".to_string(),
            source: Box::new(error),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TenantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TenantUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            subscription_status: parse_column(row, "subscription_status")?,
            subscription_plan: parse_column(row, "subscription_plan")?,
            allowed_artisans: u32_column(row, "allowed_artisans")?,
            is_active: row.try_get("is_active")?,
            stripe_customer_id: row.try_get("stripe_customer_id")?,
            stripe_subscription_id: row.try_get("stripe_subscription_id")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
