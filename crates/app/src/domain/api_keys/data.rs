//! API Key Data

use crate::domain::api_keys::{
    credentials::{ApiSecret, Scope},
    records::ApiKeyRecord,
};

/// Untrusted credentials taken from a request.
#[derive(Debug, Clone, Default)]
pub struct TenantCredentials {
    /// Value of the key id header.
    pub key_id: Option<String>,
    /// Value of the secret header.
    pub secret: Option<ApiSecret>,

    /// Epoch milliseconds, as sent by the client.
    pub timestamp: Option<String>,
}

/// New API Key Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    /// Operator-facing name.
    pub label: String,
    /// Granted scopes.
    pub scopes: Vec<Scope>,
}

impl NewApiKey {
    /// The key provisioned for a new tenant.
    #[must_use]
    pub fn production() -> Self {
        Self {
            label: "Production".to_string(),
            scopes: Scope::defaults().to_vec(),
        }
    }
}

/// A newly created key together with its one-time secret.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    /// Plaintext secret, shown once.
    pub secret: ApiSecret,
    /// Stored key.
    pub record: ApiKeyRecord,
}
