//! API key errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    api_keys::credentials::{CredentialError, Scope},
    tenants::plans::SubscriptionStatus,
};

/// Tenant authentication failures, in the order they are checked.
#[derive(Debug, Error)]
pub enum TenantAuthError {
    /// A credential header is absent.
    #[error("missing API credentials")]
    MissingCredentials,

    /// The request timestamp is outside the accepted window.
    #[error("request timestamp is outside the accepted window")]
    StaleRequest,

    /// No active key has this id.
    #[error("invalid API key")]
    InvalidKey,

    /// The secret does not match.
    #[error("invalid API secret")]
    InvalidSecret,

    /// The key lacks a scope the call needs.
    #[error("API key lacks the `{required}` scope")]
    InsufficientScope {
        /// Scope the call needs.
        required: Scope,
    },

    /// The owning tenant is deactivated.
    #[error("tenant is inactive")]
    TenantInactive,

    /// The subscription does not allow API access.
    #[error("subscription is {status}")]
    SubscriptionInactive {
        /// Current subscription status.
        status: SubscriptionStatus,
    },

    /// Secret verification failed to run.
    #[error("credential verification failed")]
    Credentials(#[from] CredentialError),

    /// Database failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for TenantAuthError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

/// API key management failures.
#[derive(Debug, Error)]
pub enum ApiKeysServiceError {
    /// A key with this id exists.
    #[error("api key already exists")]
    AlreadyExists,

    /// The key or tenant does not exist.
    #[error("api key not found")]
    NotFound,

    /// The tenant reference is invalid.
    #[error("related resource not found")]
    InvalidReference,

    /// A required column was missing.
    #[error("missing required data")]
    MissingRequiredData,

    /// A value was rejected by the database.
    #[error("invalid data")]
    InvalidData,

    /// The secret could not be hashed.
    #[error("credential hashing failed")]
    Credentials(#[from] CredentialError),

    /// Other database failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ApiKeysServiceError {
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
