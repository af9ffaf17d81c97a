//! Artisan legal documents.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        documents::{
            errors::DocumentsServiceError,
            records::{DocumentKind, DocumentRecord, DocumentStatus, DocumentUuid},
            repository::{DocumentInsert, PgDocumentsRepository},
        },
        portal_tokens::records::PortalSession,
        submissions::{
            data::NewSubmission, records::SubmissionKind, repository::PgSubmissionsRepository,
        },
        uploads::{DOCUMENT_MIME_TYPES, UploadedFile, unique_suffix},
    },
    storage::ObjectStore,
};

/// [`DocumentsService`] backed by Postgres and an object store.
#[derive(Clone)]
pub struct PgDocumentsService {
    db: Db,
    store: Arc<dyn ObjectStore>,
    repository: PgDocumentsRepository,
    submissions: PgSubmissionsRepository,
}

impl PgDocumentsService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            repository: PgDocumentsRepository::new(),
            submissions: PgSubmissionsRepository::new(),
        }
    }

    /// Replace the current document of `kind` and append its ledger entry.
    ///
    /// Returns the new row and the storage path of the replaced file, if any.
    async fn replace_document(
        &self,
        session: &PortalSession,
        kind: DocumentKind,
        filename: &str,
        storage_path: &str,
        file: &UploadedFile,
    ) -> Result<(DocumentRecord, Option<String>), DocumentsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let previous = self
            .repository
            .lock_artisan_document(&mut tx, session, kind)
            .await?;

        if let Some(previous) = &previous {
            self.repository
                .delete_document(&mut tx, session.tenant_uuid, previous.uuid)
                .await?;
        }

        let document = self
            .repository
            .insert_document(
                &mut tx,
                DocumentInsert {
                    uuid: DocumentUuid::new(),
                    session,
                    kind,
                    filename,
                    original_filename: &file.original_filename,
                    mime_type: &file.mime_type,
                    file_size: file.size(),
                    storage_path,
                },
            )
            .await?;

        self.submissions
            .append(
                &mut tx,
                NewSubmission {
                    session,
                    kind: SubmissionKind::Document,
                    intervention_id: None,
                    data: json!({
                        "document_id": document.uuid,
                        "kind": kind,
                        "filename": document.original_filename,
                        "mime_type": document.mime_type,
                        "file_size": document.file_size,
                        "storage_path": document.storage_path,
                    }),
                    storage_paths: vec![document.storage_path.clone()],
                },
            )
            .await?;

        tx.commit().await?;

        Ok((document, previous.map(|previous| previous.storage_path)))
    }
}

impl std::fmt::Debug for PgDocumentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDocumentsService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentsService for PgDocumentsService {
    async fn list_documents(
        &self,
        session: &PortalSession,
    ) -> Result<Vec<DocumentStatus>, DocumentsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let documents = self
            .repository
            .list_artisan_documents(&mut tx, session)
            .await?;

        tx.commit().await?;

        Ok(DocumentKind::ALL
            .into_iter()
            .map(|kind| {
                let current = documents.iter().find(|document| document.kind == kind);

                DocumentStatus {
                    kind,
                    uploaded: current.is_some(),
                    filename: current.map(|document| document.original_filename.clone()),
                    uploaded_at: current.map(|document| document.created_at),
                }
            })
            .collect())
    }

    async fn upload_document(
        &self,
        session: &PortalSession,
        kind: DocumentKind,
        file: UploadedFile,
    ) -> Result<DocumentRecord, DocumentsServiceError> {
        file.validate(DOCUMENT_MIME_TYPES)?;

        let filename = format!("{kind}_{}.{}", unique_suffix(), file.extension("bin"));

        let storage_path = format!(
            "{}/{}/documents/{filename}",
            session.tenant_uuid, session.artisan_id,
        );

        self.store
            .put(&storage_path, file.bytes.clone(), &file.mime_type)
            .await?;

        let (document, replaced) = match self
            .replace_document(session, kind, &filename, &storage_path, &file)
            .await
        {
            Ok(result) => result,
            Err(error) => {
                if let Err(cleanup) = self.store.remove(&[storage_path]).await {
                    warn!("failed to remove orphaned document upload: {cleanup}");
                }

                return Err(error);
            }
        };

        if let Some(replaced) = replaced
            && let Err(error) = self.store.remove(&[replaced]).await
        {
            warn!(kind = %kind, "failed to remove replaced document object: {error}");
        }

        info!(
            tenant = %session.tenant_uuid,
            artisan = %session.artisan_id,
            kind = %kind,
            "document uploaded"
        );

        Ok(document)
    }
}

/// Artisan document operations.
#[automock]
#[async_trait]
pub trait DocumentsService: Send + Sync {
    /// Upload state for every document kind, in a fixed order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentsServiceError`] when the query fails.
    async fn list_documents(
        &self,
        session: &PortalSession,
    ) -> Result<Vec<DocumentStatus>, DocumentsServiceError>;

    /// Store a document, replacing any previous file of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentsServiceError`] when the file is refused or storage fails.
    async fn upload_document(
        &self,
        session: &PortalSession,
        kind: DocumentKind,
        file: UploadedFile,
    ) -> Result<DocumentRecord, DocumentsServiceError>;
}
