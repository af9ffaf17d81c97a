//! API Keys Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    api_keys::records::{ApiKeyRecord, ApiKeyUuid, ScopeList},
    tenants::records::TenantUuid,
};

const FIND_ACTIVE_API_KEY_SQL: &str = include_str!("sql/find_active_api_key.sql");
const CREATE_API_KEY_SQL: &str = include_str!("sql/create_api_key.sql");
const LIST_API_KEYS_SQL: &str = include_str!("sql/list_api_keys.sql");
const REVOKE_API_KEY_SQL: &str = include_str!("sql/revoke_api_key.sql");
const TOUCH_API_KEY_LAST_USED_SQL: &str = include_str!("sql/touch_api_key_last_used.sql");

/// Row to insert for a new key.
#[derive(Debug, Clone)]
pub(crate) struct ApiKeyInsert<'a> {
    pub(crate) uuid: ApiKeyUuid,
    pub(crate) tenant: TenantUuid,
    pub(crate) key_id: &'a str,
    pub(crate) key_secret_hash: &'a str,
    pub(crate) label: &'a str,
    pub(crate) scopes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgApiKeysRepository;

impl PgApiKeysRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Look up a key by its public id, ignoring revoked keys.
    pub(crate) async fn find_active_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key_id: &str,
    ) -> Result<Option<ApiKeyRecord>, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(FIND_ACTIVE_API_KEY_SQL)
            .bind(key_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: ApiKeyInsert<'_>,
    ) -> Result<ApiKeyRecord, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(CREATE_API_KEY_SQL)
            .bind(key.uuid.into_uuid())
            .bind(key.tenant.into_uuid())
            .bind(key.key_id)
            .bind(key.key_secret_hash)
            .bind(key.label)
            .bind(key.scopes)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_api_keys(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<Vec<ApiKeyRecord>, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(LIST_API_KEYS_SQL)
            .bind(tenant.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn revoke_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key_id: &str,
    ) -> Result<Option<ApiKeyRecord>, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(REVOKE_API_KEY_SQL)
            .bind(tenant.into_uuid())
            .bind(key_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch_api_key_last_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: ApiKeyUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_API_KEY_LAST_USED_SQL)
            .bind(key.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for ApiKeyRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ApiKeyUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            key_id: row.try_get("key_id")?,
            key_secret_hash: row.try_get("key_secret_hash")?,
            label: row.try_get("label")?,
            scopes: row
                .try_get::<Vec<String>, _>("scopes")?
                .into_iter()
                .collect::<ScopeList>(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            last_used_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_used_at")?
                .map(SqlxTimestamp::to_jiff),
            revoked_at: row
                .try_get::<Option<SqlxTimestamp>, _>("revoked_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
