//! Photo Errors

use portal_app::domain::photos::PhotosServiceError;

use crate::{
    errors::ApiError,
    portal::{storage_error, upload_error},
};

pub(crate) fn into_api_error(error: PhotosServiceError) -> ApiError {
    match error {
        PhotosServiceError::MissingIntervention => {
            ApiError::bad_request("missing_intervention", "interventionId required")
        }
        PhotosServiceError::InvalidIntervention => {
            ApiError::bad_request("invalid_intervention", "Invalid interventionId")
        }
        PhotosServiceError::Upload(error) => upload_error(error),
        PhotosServiceError::PhotoLocked => ApiError::bad_request(
            "photo_locked",
            "Photo has been synced to the CRM and can no longer change",
        ),
        PhotosServiceError::Storage(source) => storage_error(&source),
        PhotosServiceError::NotFound => ApiError::not_found("photo_not_found", "Photo not found"),
        PhotosServiceError::AlreadyExists
        | PhotosServiceError::InvalidReference
        | PhotosServiceError::MissingRequiredData
        | PhotosServiceError::InvalidData => {
            ApiError::bad_request("invalid_request", "Invalid photo request")
        }
        PhotosServiceError::Sql(source) => ApiError::internal("failed to access photos", &source),
    }
}
