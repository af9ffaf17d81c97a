//! API Key Records

use jiff::Timestamp;
use smallvec::SmallVec;

use crate::{
    domain::{
        api_keys::credentials::Scope,
        tenants::records::{TenantRecord, TenantUuid},
    },
    uuids::TypedUuid,
};

/// API Key UUID
pub type ApiKeyUuid = TypedUuid<ApiKeyRecord>;

/// Scope strings attached to a key.
pub type ScopeList = SmallVec<[String; 4]>;

/// API Key Record
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    /// Row id.
    pub uuid: ApiKeyUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,

    /// Public identifier sent in `X-GMBS-Key-Id`.
    pub key_id: String,

    /// Argon2 PHC string of the secret.
    pub key_secret_hash: String,

    /// Operator-facing name.
    pub label: String,
    /// Granted scopes.
    pub scopes: ScopeList,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last successful authentication.
    pub last_used_at: Option<Timestamp>,
    /// Revocation time; revoked keys never authenticate.
    pub revoked_at: Option<Timestamp>,
}

impl ApiKeyRecord {
    /// Whether the key carries `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.iter().any(|granted| granted == scope.as_str())
    }
}

/// Result of a successful tenant authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedTenant {
    /// Tenant the key belongs to.
    pub tenant: TenantRecord,
    /// Key that authenticated.
    pub api_key: ApiKeyRecord,
}

impl AuthenticatedTenant {
    /// Authenticated tenant id.
    #[must_use]
    pub fn tenant_uuid(&self) -> TenantUuid {
        self.tenant.uuid
    }
}
