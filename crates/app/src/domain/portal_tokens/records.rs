//! Portal Token Records

use jiff::Timestamp;

use crate::{
    domain::{portal_tokens::metadata::PortalMetadata, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Portal Token UUID
pub type PortalTokenUuid = TypedUuid<PortalTokenRecord>;

/// Portal Token Record
///
/// Never carries the raw token; `token_prefix` is the only fragment of it
/// that is stored.
#[derive(Debug, Clone)]
pub struct PortalTokenRecord {
    /// Row id.
    pub uuid: PortalTokenUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,
    /// CRM artisan identifier.
    pub crm_artisan_id: String,
    /// Linked intervention.
    pub crm_intervention_id: Option<String>,
    /// First characters of the raw token, for support.
    pub token_prefix: String,
    /// Caller-supplied context.
    pub metadata: PortalMetadata,
    /// Expiry.
    pub expires_at: Option<Timestamp>,
    /// Cleared when the token is rotated.
    pub is_active: bool,
    /// Last successful authentication.
    pub last_accessed_at: Option<Timestamp>,
    /// Issue time.
    pub created_at: Timestamp,
}

impl PortalTokenRecord {
    /// Whether the token expired before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// The authenticated artisan behind a portal request.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSession {
    /// Token that authenticated.
    pub token_uuid: PortalTokenUuid,
    /// Tenant that issued the token.
    pub tenant_uuid: TenantUuid,
    /// CRM artisan identifier.
    pub artisan_id: String,
    /// Linked intervention.
    pub intervention_id: Option<String>,
    /// Token metadata.
    pub metadata: PortalMetadata,
}

impl From<PortalTokenRecord> for PortalSession {
    fn from(record: PortalTokenRecord) -> Self {
        Self {
            token_uuid: record.uuid,
            tenant_uuid: record.tenant_uuid,
            artisan_id: record.crm_artisan_id,
            intervention_id: record.crm_intervention_id,
            metadata: record.metadata,
        }
    }
}
