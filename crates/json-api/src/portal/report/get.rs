//! Get Report Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::report::{ReportResponse, errors::into_api_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LatestReportResponse {
    /// Most recent report in any status, `null` when none was generated yet
    pub report: Option<ReportResponse>,
}

/// Get Report Handler
#[endpoint(
    tags("portal"),
    summary = "Latest Report",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<LatestReportResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention_id = req.query::<String>("interventionId").unwrap_or_default();

    let report = state
        .app
        .reports
        .latest_report(session, &intervention_id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(LatestReportResponse {
        report: report.map(Into::into),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::reports::{MockReportsService, records::ReportStatus};

    use crate::{
        portal::report::tests::{REPORT_ID, make_report},
        test_helpers::TestApp,
    };

    use super::*;

    fn make_service(reports: MockReportsService) -> Service {
        TestApp::new()
            .reports(reports)
            .portal_service(Router::with_path("report").get(handler))
    }

    #[tokio::test]
    async fn returns_the_latest_report() -> TestResult {
        let mut reports = MockReportsService::new();

        reports
            .expect_latest_report()
            .once()
            .withf(|_, intervention| intervention == "INT-1")
            .return_once(|_, _| Ok(Some(make_report(ReportStatus::Draft))));

        let mut res = TestClient::get("http://example.com/report?interventionId=INT-1")
            .send(&make_service(reports))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["report"]["id"], json!(REPORT_ID));
        assert_eq!(body["report"]["status"], json!("draft"));
        assert_eq!(body["report"]["submittedAt"], Value::Null);

        Ok(())
    }

    #[tokio::test]
    async fn no_report_yet_is_null() -> TestResult {
        let mut reports = MockReportsService::new();

        reports
            .expect_latest_report()
            .once()
            .return_once(|_, _| Ok(None));

        let mut res = TestClient::get("http://example.com/report?interventionId=INT-1")
            .send(&make_service(reports))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "report": null }));

        Ok(())
    }
}
