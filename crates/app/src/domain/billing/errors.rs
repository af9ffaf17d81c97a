//! Billing errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{api_keys::ApiKeysServiceError, billing::provider::BillingApiError};

/// Webhook processing failures.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The event object did not deserialize.
    #[error("malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A checkout lacks its customer or subscription.
    #[error("checkout session {0} has no customer or subscription")]
    IncompleteCheckout(String),

    /// No tenant matches the customer.
    #[error("no tenant is billed to customer {0}")]
    UnknownCustomer(String),

    /// The subscription price lookup failed.
    #[error("billing API lookup failed")]
    BillingApi(#[from] BillingApiError),

    /// The initial API key could not be created.
    #[error("failed to provision API key")]
    ApiKey(#[from] ApiKeysServiceError),

    /// A tenant is already billed to this customer.
    #[error("tenant already exists")]
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

impl From<Error> for BillingError {
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
