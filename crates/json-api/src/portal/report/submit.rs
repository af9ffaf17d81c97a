//! Submit Report Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_app::domain::reports::records::ReportUuid;

use crate::{
    errors::ApiError,
    extensions::*,
    portal::report::{ReportResponse, errors::into_api_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitReportRequest {
    pub intervention_id: Option<String>,
    pub report_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubmittedReportResponse {
    pub success: bool,
    pub report: ReportResponse,
}

/// Submit Report Handler
///
/// Submitting locks the report and its photos and queues the ledger entry
/// for the CRM.
#[endpoint(
    tags("portal"),
    summary = "Submit Report",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    json: JsonBody<SubmitReportRequest>,
    depot: &mut Depot,
) -> Result<Json<SubmittedReportResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let request = json.into_inner();
    let intervention_id = request.intervention_id.unwrap_or_default();

    let report = request
        .report_id
        .ok_or_else(|| ApiError::bad_request("missing_report", "reportId required"))
        .and_then(|id| {
            Uuid::parse_str(&id)
                .map(ReportUuid::from_uuid)
                .map_err(|_invalid| ApiError::not_found("report_not_found", "Report not found"))
        })?;

    let submitted = state
        .app
        .reports
        .submit_report(session, &intervention_id, report)
        .await
        .map_err(into_api_error)?;

    Ok(Json(SubmittedReportResponse {
        success: true,
        report: submitted.into(),
    }))
}
