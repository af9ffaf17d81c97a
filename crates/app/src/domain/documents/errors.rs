//! Artisan document errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{domain::uploads::UploadError, storage::StorageError};

/// Document operation failures.
#[derive(Debug, Error)]
pub enum DocumentsServiceError {
    /// The file was refused.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The object store failed.
    #[error("object storage failed")]
    Storage(#[from] StorageError),

    /// The document already exists.
    #[error("document already exists")]
    AlreadyExists,

    /// The document does not exist.
    #[error("document not found")]
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

impl From<Error> for DocumentsServiceError {
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
