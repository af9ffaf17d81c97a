//! Intervention photos

pub(crate) mod create;
pub(crate) mod delete;
mod errors;
pub(crate) mod index;
pub(crate) mod update;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_app::domain::photos::records::{PhotoRecord, PhotoUuid, SignedPhoto};

use crate::errors::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhotoResponse {
    pub id: Uuid,

    /// Name of the file as uploaded
    pub filename: String,

    /// One-hour signed download link
    pub url: Option<String>,

    pub comment: Option<String>,
    pub synced: bool,
    pub created_at: String,
}

impl PhotoResponse {
    fn new(photo: PhotoRecord, url: Option<String>) -> Self {
        Self {
            id: photo.uuid.into_uuid(),
            filename: photo.original_filename,
            url,
            comment: photo.comment,
            synced: photo.synced_to_crm,
            created_at: photo.created_at.to_string(),
        }
    }
}

impl From<SignedPhoto> for PhotoResponse {
    fn from(signed: SignedPhoto) -> Self {
        Self::new(signed.photo, signed.url)
    }
}

impl From<PhotoRecord> for PhotoResponse {
    fn from(photo: PhotoRecord) -> Self {
        Self::new(photo, None)
    }
}

/// Unknown or malformed ids are both reported as a missing photo.
fn parse_photo_id(id: &str) -> Result<PhotoUuid, ApiError> {
    Uuid::parse_str(id)
        .map(PhotoUuid::from_uuid)
        .map_err(|_invalid| ApiError::not_found("photo_not_found", "Photo not found"))
}
