//! Report Errors

use portal_app::domain::reports::ReportsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: ReportsServiceError) -> ApiError {
    match error {
        ReportsServiceError::MissingIntervention => {
            ApiError::bad_request("missing_intervention", "interventionId required")
        }
        ReportsServiceError::InvalidIntervention => {
            ApiError::bad_request("invalid_intervention", "Invalid interventionId")
        }
        ReportsServiceError::NoPhotos => ApiError::bad_request(
            "no_photos",
            "Add at least one photo before generating the report",
        ),
        ReportsServiceError::AlreadySubmitted => {
            ApiError::conflict("already_submitted", "Report has already been submitted")
        }
        ReportsServiceError::NotFound => {
            ApiError::not_found("report_not_found", "Report not found")
        }
        ReportsServiceError::AlreadyExists
        | ReportsServiceError::InvalidReference
        | ReportsServiceError::MissingRequiredData
        | ReportsServiceError::InvalidData => {
            ApiError::bad_request("invalid_request", "Invalid report request")
        }
        ReportsServiceError::Sql(source) => ApiError::internal("failed to access reports", &source),
    }
}
