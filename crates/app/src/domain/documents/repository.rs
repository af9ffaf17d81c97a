//! Artisan Documents Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::parse_column,
    domain::{
        documents::records::{DocumentKind, DocumentRecord, DocumentUuid},
        portal_tokens::records::{PortalSession, PortalTokenUuid},
        tenants::records::TenantUuid,
    },
};

const LIST_ARTISAN_DOCUMENTS_SQL: &str = include_str!("sql/list_artisan_documents.sql");
const LOCK_ARTISAN_DOCUMENT_SQL: &str = include_str!("sql/lock_artisan_document.sql");
const DELETE_DOCUMENT_SQL: &str = include_str!("sql/delete_document.sql");
const INSERT_DOCUMENT_SQL: &str = include_str!("sql/insert_document.sql");

/// Row to insert for a new document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentInsert<'a> {
    pub(crate) uuid: DocumentUuid,
    pub(crate) session: &'a PortalSession,
    pub(crate) kind: DocumentKind,
    pub(crate) filename: &'a str,
    pub(crate) original_filename: &'a str,
    pub(crate) mime_type: &'a str,
    pub(crate) file_size: i64,
    pub(crate) storage_path: &'a str,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDocumentsRepository;

impl PgDocumentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_artisan_documents(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
    ) -> Result<Vec<DocumentRecord>, sqlx::Error> {
        query_as::<Postgres, DocumentRecord>(LIST_ARTISAN_DOCUMENTS_SQL)
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// The current document of a kind, locked for replacement.
    pub(crate) async fn lock_artisan_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &PortalSession,
        kind: DocumentKind,
    ) -> Result<Option<DocumentRecord>, sqlx::Error> {
        query_as::<Postgres, DocumentRecord>(LOCK_ARTISAN_DOCUMENT_SQL)
            .bind(session.tenant_uuid.into_uuid())
            .bind(&session.artisan_id)
            .bind(kind.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        document: DocumentUuid,
    ) -> Result<(), sqlx::Error> {
        query(DELETE_DOCUMENT_SQL)
            .bind(document.into_uuid())
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn insert_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document: DocumentInsert<'_>,
    ) -> Result<DocumentRecord, sqlx::Error> {
        query_as::<Postgres, DocumentRecord>(INSERT_DOCUMENT_SQL)
            .bind(document.uuid.into_uuid())
            .bind(document.session.tenant_uuid.into_uuid())
            .bind(document.session.token_uuid.into_uuid())
            .bind(&document.session.artisan_id)
            .bind(document.kind.as_str())
            .bind(document.filename)
            .bind(document.original_filename)
            .bind(document.mime_type)
            .bind(document.file_size)
            .bind(document.storage_path)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for DocumentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DocumentUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            portal_token_uuid: PortalTokenUuid::from_uuid(row.try_get("portal_token_uuid")?),
            crm_artisan_id: row.try_get("crm_artisan_id")?,
            kind: parse_column(row, "kind")?,
            filename: row.try_get("filename")?,
            original_filename: row.try_get("original_filename")?,
            mime_type: row.try_get("mime_type")?,
            file_size: row.try_get("file_size")?,
            storage_path: row.try_get("storage_path")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
