//! Portal token errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Portal token authentication failures, in the order they are checked.
#[derive(Debug, Error)]
pub enum PortalTokenError {
    /// No token was presented.
    #[error("token required")]
    TokenRequired,

    /// No token matches.
    #[error("invalid token")]
    InvalidToken,

    /// The token was deactivated.
    #[error("token revoked")]
    TokenRevoked,

    /// The token is past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// The endpoint needs an intervention-linked token.
    #[error("token is not linked to an intervention")]
    TokenNotLinked,

    /// Database failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PortalTokenError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

/// Token issue failures.
#[derive(Debug, Error)]
pub enum TokenIssueError {
    /// No artisan id was given.
    #[error("crm_artisan_id is required")]
    MissingArtisan,

    /// The artisan id has invalid characters.
    #[error("crm_artisan_id may only contain letters, digits, `-`, `_` and `.`")]
    InvalidArtisan,

    /// A new artisan would exceed the tenant's quota.
    #[error("artisan limit reached")]
    QuotaExceeded {
        /// Plan quota.
        limit: u32,
        /// Artisans currently holding an active token.
        current: u32,
    },

    /// Another active token was inserted first.
    #[error("an active token was issued concurrently")]
    AlreadyExists,

    /// The tenant does not exist.
    #[error("tenant not found")]
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

impl From<Error> for TokenIssueError {
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
