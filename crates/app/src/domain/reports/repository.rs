//! Intervention Reports Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::parse_column,
    domain::{
        photos::records::PhotoUuid,
        portal_tokens::records::{PortalSession, PortalTokenUuid},
        reports::records::{ReportRecord, ReportUuid},
        tenants::records::TenantUuid,
    },
};

const UPSERT_DRAFT_REPORT_SQL: &str = include_str!("sql/upsert_draft_report.sql");
const FIND_LATEST_REPORT_SQL: &str = include_str!("sql/find_latest_report.sql");
const LOCK_REPORT_SQL: &str = include_str!("sql/lock_report.sql");
const SUBMIT_REPORT_SQL: &str = include_str!("sql/submit_report.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReportsRepository;

impl PgReportsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create the intervention's draft, or overwrite the one that exists.
    pub(crate) async fn upsert_draft(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        intervention_id: &str,
        content: &str,
        photos: &[Uuid],
    ) -> Result<ReportRecord, sqlx::Error> {
        query_as::<Postgres, ReportRecord>(UPSERT_DRAFT_REPORT_SQL)
            .bind(ReportUuid::new().into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(session.token_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(intervention_id)
            .bind(content)
            .bind(photos)
            .fetch_one(&mut **tx)
            .await
    }

    /// Most recent report of an intervention, optionally only submitted ones.
    pub(crate) async fn find_latest_report(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
        intervention_id: &str,
        submitted_only: bool,
    ) -> Result<Option<ReportRecord>, sqlx::Error> {
        query_as::<Postgres, ReportRecord>(FIND_LATEST_REPORT_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .bind(intervention_id)
            .bind(submitted_only)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn lock_report(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        intervention_id: &str,
        report: ReportUuid,
    ) -> Result<Option<ReportRecord>, sqlx::Error> {
        query_as::<Postgres, ReportRecord>(LOCK_REPORT_SQL)
            .bind(report.into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(intervention_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn submit_report(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        report: ReportUuid,
    ) -> Result<ReportRecord, sqlx::Error> {
        query_as::<Postgres, ReportRecord>(SUBMIT_REPORT_SQL)
            .bind(report.into_uuid())
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ReportRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let photo_uuids: Vec<Uuid> = row.try_get("photo_uuids")?;

        Ok(Self {
            uuid: ReportUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            portal_token_uuid: PortalTokenUuid::from_uuid(row.try_get("portal_token_uuid")?),
            crm_artisan_id: row.try_get("crm_artisan_id")?,
            crm_intervention_id: row.try_get("crm_intervention_id")?,
            content: row.try_get("content")?,
            photo_uuids: photo_uuids.into_iter().map(PhotoUuid::from_uuid).collect(),
            status: parse_column(row, "status")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            submitted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("submitted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
