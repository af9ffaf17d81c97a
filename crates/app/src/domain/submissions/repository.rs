//! Submissions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::parse_column,
    domain::{
        portal_tokens::records::PortalTokenUuid,
        submissions::{
            data::{NewSubmission, SubmissionQuery},
            records::{SubmissionRecord, SubmissionUuid},
        },
        tenants::records::TenantUuid,
    },
};

const LIST_SUBMISSIONS_SQL: &str = include_str!("sql/list_submissions.sql");
const FIND_OWNED_SUBMISSION_UUIDS_SQL: &str = include_str!("sql/find_owned_submission_uuids.sql");
const MARK_SUBMISSIONS_SYNCED_SQL: &str = include_str!("sql/mark_submissions_synced.sql");
const INSERT_SUBMISSION_SQL: &str = include_str!("sql/insert_submission.sql");
const DELETE_UNSYNCED_PHOTO_SUBMISSION_SQL: &str =
    include_str!("sql/delete_unsynced_photo_submission.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSubmissionsRepository;

impl PgSubmissionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_submissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        filter: &SubmissionQuery,
    ) -> Result<Vec<SubmissionRecord>, sqlx::Error> {
        query_as::<Postgres, SubmissionRecord>(LIST_SUBMISSIONS_SQL)
            .bind(tenant.into_uuid())
            .bind(filter.since.map(SqlxTimestamp::from))
            .bind(filter.unsynced)
            .bind(i64::from(filter.page_size()))
            .bind(filter.after.map(SubmissionUuid::into_uuid))
            .fetch_all(&mut **tx)
            .await
    }

    /// The subset of `uuids` owned by `tenant`.
    pub(crate) async fn find_owned_submission_uuids(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        uuids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        query_scalar(FIND_OWNED_SUBMISSION_UUIDS_SQL)
            .bind(tenant.into_uuid())
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Flip unsynced rows to synced. Returns the number of rows that changed.
    pub(crate) async fn mark_submissions_synced(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        uuids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = query(MARK_SUBMISSIONS_SYNCED_SQL)
            .bind(tenant.into_uuid())
            .bind(uuids)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Append a ledger entry inside the caller's transaction.
    pub(crate) async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        submission: NewSubmission<'_>,
    ) -> Result<SubmissionRecord, sqlx::Error> {
        let session = submission.session;

        query_as::<Postgres, SubmissionRecord>(INSERT_SUBMISSION_SQL)
            .bind(SubmissionUuid::new().into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(session.token_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(submission.intervention_id)
            .bind(submission.kind.as_str())
            .bind(submission.data)
            .bind(submission.storage_paths)
            .fetch_one(&mut **tx)
            .await
    }

    /// Drop the unsynced `photo` entry that references `photo_uuid`.
    pub(crate) async fn delete_unsynced_photo_submission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
        photo_uuid: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = query(DELETE_UNSYNCED_PHOTO_SUBMISSION_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .bind(photo_uuid.to_string())
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}

impl<'r> FromRow<'r, PgRow> for SubmissionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SubmissionUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            portal_token_uuid: PortalTokenUuid::from_uuid(row.try_get("portal_token_uuid")?),
            crm_artisan_id: row.try_get("crm_artisan_id")?,
            crm_intervention_id: row.try_get("crm_intervention_id")?,
            kind: parse_column(row, "type")?,
            data: row.try_get("data")?,
            storage_paths: row.try_get("storage_paths")?,
            synced_to_crm: row.try_get("synced_to_crm")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            synced_at: row
                .try_get::<Option<SqlxTimestamp>, _>("synced_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
