//! Document Errors

use portal_app::domain::documents::DocumentsServiceError;

use crate::{
    errors::ApiError,
    portal::{storage_error, upload_error},
};

pub(crate) fn into_api_error(error: DocumentsServiceError) -> ApiError {
    match error {
        DocumentsServiceError::Upload(error) => upload_error(error),
        DocumentsServiceError::Storage(source) => storage_error(&source),
        DocumentsServiceError::NotFound => {
            ApiError::not_found("document_not_found", "Document not found")
        }
        DocumentsServiceError::AlreadyExists
        | DocumentsServiceError::InvalidReference
        | DocumentsServiceError::MissingRequiredData
        | DocumentsServiceError::InvalidData => {
            ApiError::bad_request("invalid_request", "Invalid document request")
        }
        DocumentsServiceError::Sql(source) => {
            ApiError::internal("failed to access documents", &source)
        }
    }
}
