//! Errors shared by the portal handlers.

use tracing::error;

use portal_app::{
    domain::uploads::{MAX_UPLOAD_BYTES, UploadError},
    storage::StorageError,
};

use crate::{errors::ApiError, observability::observe_upstream_failure};

pub(crate) fn upload_error(error: UploadError) -> ApiError {
    match error {
        UploadError::Empty => ApiError::bad_request("file_required", "File required"),
        UploadError::TooLarge { size } => {
            ApiError::bad_request("file_too_large", error.to_string())
                .with("size", size)
                .with("max_size", MAX_UPLOAD_BYTES)
        }
        UploadError::UnsupportedType { .. } => {
            ApiError::bad_request("unsupported_type", error.to_string())
        }
    }
}

pub(crate) fn storage_error(source: &StorageError) -> ApiError {
    error!("object storage failed: {source}");
    observe_upstream_failure("storage");

    ApiError::upstream("Upload failed")
}
