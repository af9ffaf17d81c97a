//! Generate Report Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::report::{ReportResponse, errors::into_api_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateReportRequest {
    pub intervention_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GeneratedReportResponse {
    pub report: ReportResponse,
}

/// Generate Report Handler
///
/// Builds the draft from the intervention's photos. An existing draft is
/// regenerated in place; a submitted report cannot be replaced.
#[endpoint(
    tags("portal"),
    summary = "Generate Report",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    json: JsonBody<GenerateReportRequest>,
    depot: &mut Depot,
) -> Result<Json<GeneratedReportResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention_id = json.into_inner().intervention_id.unwrap_or_default();

    let report = state
        .app
        .reports
        .generate_report(session, &intervention_id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(GeneratedReportResponse {
        report: report.into(),
    }))
}
