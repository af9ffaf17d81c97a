//! Photos Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    photos::records::{PhotoRecord, PhotoUuid},
    portal_tokens::records::{PortalSession, PortalTokenUuid},
    tenants::records::TenantUuid,
};

const INSERT_PHOTO_SQL: &str = include_str!("sql/insert_photo.sql");
const LIST_INTERVENTION_PHOTOS_SQL: &str = include_str!("sql/list_intervention_photos.sql");
const LOCK_PHOTO_SQL: &str = include_str!("sql/lock_photo.sql");
const UPDATE_PHOTO_COMMENT_SQL: &str = include_str!("sql/update_photo_comment.sql");
const DELETE_PHOTO_SQL: &str = include_str!("sql/delete_photo.sql");
const FIND_PHOTOS_BY_UUIDS_SQL: &str = include_str!("sql/find_photos_by_uuids.sql");
const MARK_PHOTOS_SYNCED_SQL: &str = include_str!("sql/mark_photos_synced.sql");

/// Row to insert for a new photo.
#[derive(Debug, Clone)]
pub(crate) struct PhotoInsert<'a> {
    pub(crate) uuid: PhotoUuid,
    pub(crate) session: &'a PortalSession,
    pub(crate) intervention_id: &'a str,
    pub(crate) filename: &'a str,
    pub(crate) original_filename: &'a str,
    pub(crate) mime_type: &'a str,
    pub(crate) file_size: i64,
    pub(crate) storage_path: &'a str,
    pub(crate) comment: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPhotosRepository;

impl PgPhotosRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_photo(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        photo: PhotoInsert<'_>,
    ) -> Result<PhotoRecord, sqlx::Error> {
        query_as::<Postgres, PhotoRecord>(INSERT_PHOTO_SQL)
            .bind(photo.uuid.into_uuid())
            .bind(photo.session.tenant_uuid.into_uuid())
            .bind(photo.session.token_uuid.into_uuid())
            .bind(&photo.session.artisan_id)
            .bind(photo.intervention_id)
            .bind(photo.filename)
            .bind(photo.original_filename)
            .bind(photo.mime_type)
            .bind(photo.file_size)
            .bind(photo.storage_path)
            .bind(photo.comment)
            .fetch_one(&mut **tx)
            .await
    }

    /// Photos of one intervention, oldest first.
    pub(crate) async fn list_intervention_photos(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<Vec<PhotoRecord>, sqlx::Error> {
        query_as::<Postgres, PhotoRecord>(LIST_INTERVENTION_PHOTOS_SQL)
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(intervention_id)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn lock_photo(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        photo: PhotoUuid,
    ) -> Result<PhotoRecord, sqlx::Error> {
        query_as::<Postgres, PhotoRecord>(LOCK_PHOTO_SQL)
            .bind(photo.into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_photo_comment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        photo: PhotoUuid,
        comment: Option<&str>,
    ) -> Result<PhotoRecord, sqlx::Error> {
        query_as::<Postgres, PhotoRecord>(UPDATE_PHOTO_COMMENT_SQL)
            .bind(photo.into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(comment)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_photo(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        photo: PhotoUuid,
    ) -> Result<u64, sqlx::Error> {
        let result = query(DELETE_PHOTO_SQL)
            .bind(photo.into_uuid())
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// The artisan's photos among `photos`, oldest first. Foreign ids are skipped.
    pub(crate) async fn find_photos_by_uuids(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
        photos: &[Uuid],
    ) -> Result<Vec<PhotoRecord>, sqlx::Error> {
        query_as::<Postgres, PhotoRecord>(FIND_PHOTOS_BY_UUIDS_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .bind(photos)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn mark_photos_synced(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        artisan: &str,
        photos: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = query(MARK_PHOTOS_SYNCED_SQL)
            .bind(tenant.into_uuid())
            .bind(artisan)
            .bind(photos)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}

impl<'r> FromRow<'r, PgRow> for PhotoRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PhotoUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            portal_token_uuid: PortalTokenUuid::from_uuid(row.try_get("portal_token_uuid")?),
            crm_artisan_id: row.try_get("crm_artisan_id")?,
            crm_intervention_id: row.try_get("crm_intervention_id")?,
            filename: row.try_get("filename")?,
            original_filename: row.try_get("original_filename")?,
            mime_type: row.try_get("mime_type")?,
            file_size: row.try_get("file_size")?,
            storage_path: row.try_get("storage_path")?,
            comment: row.try_get("comment")?,
            synced_to_crm: row.try_get("synced_to_crm")?,
            synced_at: row
                .try_get::<Option<SqlxTimestamp>, _>("synced_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
