//! Submission Errors

use portal_app::domain::submissions::{SubmissionsServiceError, data::MAX_ACK_BATCH};

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: SubmissionsServiceError) -> ApiError {
    match error {
        SubmissionsServiceError::EmptyBatch => {
            ApiError::bad_request("ids_required", "ids array required")
        }
        SubmissionsServiceError::BatchTooLarge => ApiError::bad_request(
            "batch_too_large",
            format!("Maximum {MAX_ACK_BATCH} ids per request"),
        ),
        SubmissionsServiceError::CrossTenantReference { invalid_ids } => ApiError::forbidden(
            "cross_tenant_reference",
            "Some submission ids do not belong to this tenant",
        )
        .with("invalid_ids", invalid_ids),
        SubmissionsServiceError::NotFound => {
            ApiError::not_found("submission_not_found", "Submission not found")
        }
        SubmissionsServiceError::AlreadyExists
        | SubmissionsServiceError::InvalidReference
        | SubmissionsServiceError::MissingRequiredData
        | SubmissionsServiceError::InvalidData => {
            ApiError::bad_request("invalid_request", "Invalid submission request")
        }
        SubmissionsServiceError::Sql(source) => {
            ApiError::internal("failed to access submissions", &source)
        }
    }
}
