//! Intervention Report Handler
//!
//! Lets the CRM pull what an artisan submitted for an intervention.

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_app::domain::{
    photos::records::SignedPhoto,
    reports::records::{ReportRecord, SubmittedReport},
};

use crate::{
    errors::ApiError, extensions::*, portal::report::errors::into_api_error, state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmittedReportBody {
    pub id: Uuid,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub submitted_at: Option<String>,
}

impl From<ReportRecord> for SubmittedReportBody {
    fn from(report: ReportRecord) -> Self {
        Self {
            id: report.uuid.into_uuid(),
            content: report.content,
            status: report.status.to_string(),
            created_at: report.created_at.to_string(),
            submitted_at: report.submitted_at.map(|at| at.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReportPhoto {
    pub id: Uuid,

    /// One-hour signed download link
    pub url: String,

    pub filename: String,
    pub comment: Option<String>,
}

impl ReportPhoto {
    /// Photos whose link could not be signed are left out.
    fn signed(signed: SignedPhoto) -> Option<Self> {
        Some(Self {
            url: signed.url?,
            id: signed.photo.uuid.into_uuid(),
            filename: signed.photo.original_filename,
            comment: signed.photo.comment,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct InterventionReportResponse {
    pub report: Option<SubmittedReportBody>,
    pub photos: Vec<ReportPhoto>,
}

impl From<Option<SubmittedReport>> for InterventionReportResponse {
    fn from(submitted: Option<SubmittedReport>) -> Self {
        let Some(submitted) = submitted else {
            return Self {
                report: None,
                photos: Vec::new(),
            };
        };

        Self {
            report: Some(submitted.report.into()),
            photos: submitted
                .photos
                .into_iter()
                .filter_map(ReportPhoto::signed)
                .collect(),
        }
    }
}

/// Intervention Report Handler
///
/// The latest submitted report of `artisanId` for the intervention, with its
/// photos. `report` is `null` while nothing was submitted.
#[endpoint(
    tags("interventions"),
    summary = "Submitted Intervention Report",
    security(("gmbs_key_id" = [], "gmbs_secret" = []))
)]
pub(crate) async fn handler(
    intervention_id: PathParam<String>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<InterventionReportResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_or_401()?.tenant_uuid();

    let artisan_id = req
        .query::<String>("artisanId")
        .filter(|artisan| !artisan.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing_artisan", "artisanId required"))?;

    let submitted = state
        .app
        .reports
        .submitted_report(tenant, &artisan_id, &intervention_id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(submitted.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::reports::{MockReportsService, records::ReportStatus};

    use crate::{
        portal::report::tests::{REPORT_ID, make_report},
        test_helpers::{TEST_TENANT_UUID, TestApp},
    };

    use super::*;

    fn make_service(reports: MockReportsService) -> Service {
        TestApp::new().reports(reports).tenant_service(
            Router::with_path("interventions/{intervention_id}/report").get(handler),
        )
    }

    fn photo(url: Option<&str>) -> SignedPhoto {
        SignedPhoto {
            photo: crate::portal::photos::tests::make_photo(),
            url: url.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn returns_the_submitted_report_with_signed_photos() -> TestResult {
        let mut reports = MockReportsService::new();

        reports
            .expect_submitted_report()
            .once()
            .withf(|tenant, artisan, intervention| {
                *tenant == TEST_TENANT_UUID && artisan == "ART-1" && intervention == "INT-1"
            })
            .return_once(|_, _, _| {
                Ok(Some(SubmittedReport {
                    report: make_report(ReportStatus::Submitted),
                    photos: vec![photo(Some("https://storage.test/signed")), photo(None)],
                }))
            });

        let mut res = TestClient::get("http://example.com/interventions/INT-1/report?artisanId=ART-1")
            .send(&make_service(reports))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["report"]["id"], json!(REPORT_ID));
        assert_eq!(body["report"]["status"], json!("submitted"));
        assert_eq!(body["photos"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["photos"][0]["url"], json!("https://storage.test/signed"));

        Ok(())
    }

    #[tokio::test]
    async fn nothing_submitted_yet() -> TestResult {
        let mut reports = MockReportsService::new();

        reports
            .expect_submitted_report()
            .once()
            .return_once(|_, _, _| Ok(None));

        let mut res = TestClient::get("http://example.com/interventions/INT-1/report?artisanId=ART-1")
            .send(&make_service(reports))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "report": null, "photos": [] }));

        Ok(())
    }

    #[tokio::test]
    async fn artisan_is_required() -> TestResult {
        let res = TestClient::get("http://example.com/interventions/INT-1/report")
            .send(&make_service(MockReportsService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
