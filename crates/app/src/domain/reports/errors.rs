//! Intervention report errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Report operation failures.
#[derive(Debug, Error)]
pub enum ReportsServiceError {
    /// No intervention id was given.
    #[error("interventionId is required")]
    MissingIntervention,

    /// The intervention id has invalid characters.
    #[error("interventionId may only contain letters, digits, `-`, `_` and `.`")]
    InvalidIntervention,

    /// The intervention has no photos.
    #[error("add at least one photo before generating the report")]
    NoPhotos,

    /// The report is submitted and immutable.
    #[error("report has already been submitted")]
    AlreadySubmitted,

    /// A draft already exists.
    #[error("report already exists")]
    AlreadyExists,

    /// The report does not exist for this artisan.
    #[error("report not found")]
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

impl From<Error> for ReportsServiceError {
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
