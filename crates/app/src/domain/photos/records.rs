//! Photo Records

use jiff::Timestamp;

use crate::{
    domain::{portal_tokens::records::PortalTokenUuid, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Photo UUID
pub type PhotoUuid = TypedUuid<PhotoRecord>;

/// Photo Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    /// Row id.
    pub uuid: PhotoUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,
    /// Token the upload came through.
    pub portal_token_uuid: PortalTokenUuid,
    /// CRM artisan identifier.
    pub crm_artisan_id: String,
    /// CRM intervention identifier.
    pub crm_intervention_id: String,

    /// Generated object name.
    pub filename: String,

    /// Name given by the uploader.
    pub original_filename: String,
    /// Declared content type.
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Object key in the store.
    pub storage_path: String,
    /// Caption.
    pub comment: Option<String>,

    /// Synced photos are part of a submitted report and can no longer change.
    pub synced_to_crm: bool,

    /// When the photo was synced.
    pub synced_at: Option<Timestamp>,
    /// Upload time.
    pub created_at: Timestamp,
    /// Last change to the caption or sync state.
    pub updated_at: Timestamp,
}

/// A photo with a time-limited download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPhoto {
    /// The stored photo.
    pub photo: PhotoRecord,

    /// `None` when the store could not sign the link.
    pub url: Option<String>,
}
