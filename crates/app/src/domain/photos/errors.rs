//! Photo errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{domain::uploads::UploadError, storage::StorageError};

/// Photo operation failures.
#[derive(Debug, Error)]
pub enum PhotosServiceError {
    /// No intervention id was given.
    #[error("interventionId required")]
    MissingIntervention,

    /// The intervention id has invalid characters.
    #[error("invalid interventionId")]
    InvalidIntervention,

    /// The file was refused.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The photo is synced and can no longer change.
    #[error("photo has been synced to the CRM and can no longer change")]
    PhotoLocked,

    /// The object store failed.
    #[error("object storage failed")]
    Storage(#[from] StorageError),

    /// The photo already exists.
    #[error("photo already exists")]
    AlreadyExists,

    /// The photo does not exist for this artisan.
    #[error("photo not found")]
    NotFound,

    /// A referenced row does not exist.
    #[error("related resource not found")]
    InvalidReference,

    /// A required column was missing.
    #[error("missing required data")]
    MissingRequiredData,

    /// A value was rejected by the database.
    #[error("invalid data")]
    InvalidData,

    /// Other database failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PhotosServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
