//! Submission ledger errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::submissions::data::MAX_ACK_BATCH;

/// Ledger operation failures.
#[derive(Debug, Error)]
pub enum SubmissionsServiceError {
    /// No ids were given.
    #[error("ids array required")]
    EmptyBatch,

    /// Too many ids in one batch.
    #[error("maximum {MAX_ACK_BATCH} ids per request")]
    BatchTooLarge,

    /// Some ids are unknown to, or owned by another tenant than, the caller.
    #[error("some submission ids do not belong to this tenant")]
    CrossTenantReference {
        /// Offending ids, as sent.
        invalid_ids: Vec<String>,
    },

    /// The entry already exists.
    #[error("submission already exists")]
    AlreadyExists,

    /// The entry does not exist.
    #[error("submission not found")]
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

impl From<Error> for SubmissionsServiceError {
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
