//! Portal Tokens Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::{
    portal_tokens::{
        metadata::PortalMetadata,
        records::{PortalTokenRecord, PortalTokenUuid},
    },
    tenants::records::TenantUuid,
};

const FIND_ACTIVE_ARTISAN_TOKEN_SQL: &str = include_str!("sql/find_active_artisan_token.sql");
const DEACTIVATE_ARTISAN_TOKENS_SQL: &str = include_str!("sql/deactivate_artisan_tokens.sql");
const CREATE_PORTAL_TOKEN_SQL: &str = include_str!("sql/create_portal_token.sql");
const FIND_TOKEN_BY_HASH_SQL: &str = include_str!("sql/find_token_by_hash.sql");
const TOUCH_TOKEN_LAST_ACCESSED_SQL: &str = include_str!("sql/touch_token_last_accessed.sql");

/// Row to insert for a new token.
#[derive(Debug, Clone)]
pub(crate) struct PortalTokenInsert<'a> {
    pub(crate) uuid: PortalTokenUuid,
    pub(crate) tenant: TenantUuid,
    pub(crate) crm_artisan_id: &'a str,
    pub(crate) crm_intervention_id: Option<&'a str>,
    pub(crate) token_hash: String,
    pub(crate) token_prefix: String,
    pub(crate) metadata: &'a PortalMetadata,
    pub(crate) expires_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPortalTokensRepository;

impl PgPortalTokensRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_active_artisan_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
    ) -> Result<Option<PortalTokenRecord>, sqlx::Error> {
        query_as::<Postgres, PortalTokenRecord>(FIND_ACTIVE_ARTISAN_TOKEN_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Deactivate every active token of an artisan. Returns the number of rows changed.
    pub(crate) async fn deactivate_artisan_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = query(DEACTIVATE_ARTISAN_TOKENS_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn create_portal_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: PortalTokenInsert<'_>,
    ) -> Result<PortalTokenRecord, sqlx::Error> {
        query_as::<Postgres, PortalTokenRecord>(CREATE_PORTAL_TOKEN_SQL)
            .bind(token.uuid.into_uuid())
            .bind(token.tenant.into_uuid())
            .bind(token.crm_artisan_id)
            .bind(token.crm_intervention_id)
            .bind(token.token_hash)
            .bind(token.token_prefix)
            .bind(Json(token.metadata))
            .bind(SqlxTimestamp::from(token.expires_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Look up a token by hash regardless of its state.
    pub(crate) async fn find_token_by_hash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token_hash: &str,
    ) -> Result<Option<PortalTokenRecord>, sqlx::Error> {
        query_as::<Postgres, PortalTokenRecord>(FIND_TOKEN_BY_HASH_SQL)
            .bind(token_hash)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch_token_last_accessed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: PortalTokenUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_TOKEN_LAST_ACCESSED_SQL)
            .bind(token.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for PortalTokenRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PortalTokenUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            crm_artisan_id: row.try_get("crm_artisan_id")?,
            crm_intervention_id: row.try_get("crm_intervention_id")?,
            token_prefix: row.try_get("token_prefix")?,
            metadata: row.try_get::<Json<PortalMetadata>, _>("metadata")?.0,
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            is_active: row.try_get("is_active")?,
            last_accessed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_accessed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
