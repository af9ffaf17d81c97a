//! Intervention photos.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        photos::{
            data::NewPhoto,
            errors::PhotosServiceError,
            records::{PhotoRecord, PhotoUuid, SignedPhoto},
            repository::{PgPhotosRepository, PhotoInsert},
        },
        portal_tokens::records::PortalSession,
        submissions::{
            data::NewSubmission, records::SubmissionKind, repository::PgSubmissionsRepository,
        },
        uploads::{PHOTO_MIME_TYPES, UploadedFile, is_safe_path_segment, unique_suffix},
    },
    storage::{ObjectStore, SIGNED_URL_TTL},
};

/// [`PhotosService`] backed by Postgres and an object store.
#[derive(Clone)]
pub struct PgPhotosService {
    db: Db,
    store: Arc<dyn ObjectStore>,
    repository: PgPhotosRepository,
    submissions: PgSubmissionsRepository,
}

impl PgPhotosService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            repository: PgPhotosRepository::new(),
            submissions: PgSubmissionsRepository::new(),
        }
    }

    /// Persist the photo row and its ledger entry in one transaction.
    async fn record_upload(
        &self,
        session: &PortalSession,
        intervention_id: &str,
        comment: Option<&str>,
        filename: &str,
        storage_path: &str,
        file: &UploadedFile,
    ) -> Result<PhotoRecord, PhotosServiceError> {
        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let photo = self
            .repository
            .insert_photo(
                &mut tx,
                PhotoInsert {
                    uuid: PhotoUuid::new(),
                    session,
                    intervention_id,
                    filename,
                    original_filename: &file.original_filename,
                    mime_type: &file.mime_type,
                    file_size: file.size(),
                    storage_path,
                    comment,
                },
            )
            .await?;

        self.submissions
            .append(
                &mut tx,
                NewSubmission {
                    session,
                    kind: SubmissionKind::Photo,
                    intervention_id: Some(intervention_id),
                    data: json!({
                        "photo_id": photo.uuid,
                        "filename": photo.original_filename,
                        "mime_type": photo.mime_type,
                        "file_size": photo.file_size,
                        "comment": photo.comment,
                    }),
                    storage_paths: vec![photo.storage_path.clone()],
                },
            )
            .await?;

        tx.commit().await?;

        Ok(photo)
    }
}

impl std::fmt::Debug for PgPhotosService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPhotosService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PhotosService for PgPhotosService {
    async fn list_photos(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<Vec<SignedPhoto>, PhotosServiceError> {
        let intervention_id = checked_intervention(intervention_id)?;

        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let photos = self
            .repository
            .list_intervention_photos(&mut tx, session, intervention_id)
            .await?;

        tx.commit().await?;

        Ok(sign_photos(self.store.as_ref(), photos).await)
    }

    async fn upload_photo(
        &self,
        session: &PortalSession,
        photo: NewPhoto,
    ) -> Result<SignedPhoto, PhotosServiceError> {
        let intervention_id = checked_intervention(&photo.intervention_id)?;

        photo.file.validate(PHOTO_MIME_TYPES)?;

        let comment = photo
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty());

        let filename = format!(
            "photo_{}_{}.{}",
            Timestamp::now().as_millisecond(),
            unique_suffix(),
            photo.file.extension("jpg"),
        );

        let storage_path = format!(
            "{}/{}/interventions/{intervention_id}/{filename}",
            session.tenant_uuid, session.artisan_id,
        );

        self.store
            .put(&storage_path, photo.file.bytes.clone(), &photo.file.mime_type)
            .await?;

        let record = match self
            .record_upload(
                session,
                intervention_id,
                comment,
                &filename,
                &storage_path,
                &photo.file,
            )
            .await
        {
            Ok(record) => record,
            Err(error) => {
                if let Err(cleanup) = self.store.remove(&[storage_path]).await {
                    warn!("failed to remove orphaned photo upload: {cleanup}");
                }

                return Err(error);
            }
        };

        let url = sign_url(self.store.as_ref(), &record.storage_path).await;

        Ok(SignedPhoto { photo: record, url })
    }

    async fn update_comment(
        &self,
        session: &PortalSession,
        photo: PhotoUuid,
        comment: Option<String>,
    ) -> Result<PhotoRecord, PhotosServiceError> {
        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let current = self.repository.lock_photo(&mut tx, session, photo).await?;

        if current.synced_to_crm {
            return Err(PhotosServiceError::PhotoLocked);
        }

        let comment = comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty());

        let updated = self
            .repository
            .update_photo_comment(&mut tx, session, photo, comment)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_photo(
        &self,
        session: &PortalSession,
        photo: PhotoUuid,
    ) -> Result<(), PhotosServiceError> {
        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let current = self.repository.lock_photo(&mut tx, session, photo).await?;

        if current.synced_to_crm {
            return Err(PhotosServiceError::PhotoLocked);
        }

        self.repository.delete_photo(&mut tx, session, photo).await?;

        self.submissions
            .delete_unsynced_photo_submission(
                &mut tx,
                session.tenant_uuid,
                &session.artisan_id,
                photo.into_uuid(),
            )
            .await?;

        tx.commit().await?;

        if let Err(error) = self.store.remove(&[current.storage_path]).await {
            warn!(photo = %photo, "failed to remove deleted photo object: {error}");
        }

        Ok(())
    }
}

fn checked_intervention(intervention_id: &str) -> Result<&str, PhotosServiceError> {
    let intervention_id = intervention_id.trim();

    if intervention_id.is_empty() {
        return Err(PhotosServiceError::MissingIntervention);
    }

    if !is_safe_path_segment(intervention_id) {
        return Err(PhotosServiceError::InvalidIntervention);
    }

    Ok(intervention_id)
}

async fn sign_url(store: &dyn ObjectStore, path: &str) -> Option<String> {
    match store.signed_url(path, SIGNED_URL_TTL).await {
        Ok(url) => Some(url),
        Err(error) => {
            warn!(path, "failed to sign photo url: {error}");

            None
        }
    }
}

/// Attach one-hour download links. Signing failures leave `url` empty.
pub(crate) async fn sign_photos(
    store: &dyn ObjectStore,
    photos: Vec<PhotoRecord>,
) -> Vec<SignedPhoto> {
    let mut signed = Vec::with_capacity(photos.len());

    for photo in photos {
        let url = sign_url(store, &photo.storage_path).await;

        signed.push(SignedPhoto { photo, url });
    }

    signed
}

/// Intervention photo operations.
#[automock]
#[async_trait]
pub trait PhotosService: Send + Sync {
    /// Photos of an intervention with signed links, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PhotosServiceError`] for an invalid intervention id or a failed query.
    async fn list_photos(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<Vec<SignedPhoto>, PhotosServiceError>;

    /// Store a photo and append its ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`PhotosServiceError`] when the input or file is refused or storage fails.
    async fn upload_photo(
        &self,
        session: &PortalSession,
        photo: NewPhoto,
    ) -> Result<SignedPhoto, PhotosServiceError>;

    /// Replace the caption of an unsynced photo.
    ///
    /// # Errors
    ///
    /// Returns [`PhotosServiceError::PhotoLocked`] for a synced photo and `NotFound` for another artisan's.
    async fn update_comment(
        &self,
        session: &PortalSession,
        photo: PhotoUuid,
        comment: Option<String>,
    ) -> Result<PhotoRecord, PhotosServiceError>;

    /// Delete an unsynced photo together with its pending ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`PhotosServiceError::PhotoLocked`] for a synced photo and `NotFound` for another artisan's.
    async fn delete_photo(
        &self,
        session: &PortalSession,
        photo: PhotoUuid,
    ) -> Result<(), PhotosServiceError>;
}
