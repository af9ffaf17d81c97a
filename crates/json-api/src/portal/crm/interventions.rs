//! CRM Intervention Handlers

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::crm::{checked_intervention, crm_error},
    state::State,
};

/// Status forwarded when the artisan does not pick one.
const DEFAULT_REPORT_STATUS: &str = "submitted";

/// Interventions assigned to the artisan.
#[endpoint(
    tags("crm"),
    summary = "List CRM Interventions",
    security(("portal_token" = []))
)]
pub(crate) async fn index(depot: &mut Depot) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let body = state
        .app
        .crm
        .artisan_interventions(&session.artisan_id)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

/// A single intervention.
#[endpoint(
    tags("crm"),
    summary = "Get CRM Intervention",
    security(("portal_token" = []))
)]
pub(crate) async fn show(
    intervention_id: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention = checked_intervention(&intervention_id)?;

    let body = state
        .app
        .crm
        .intervention_detail(intervention, &session.artisan_id)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

/// Documents attached to an intervention.
#[endpoint(
    tags("crm"),
    summary = "List CRM Intervention Documents",
    security(("portal_token" = []))
)]
pub(crate) async fn documents(
    intervention_id: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention = checked_intervention(&intervention_id)?;

    let body = state
        .app
        .crm
        .intervention_documents(intervention, &session.artisan_id)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

/// The report the CRM holds for an intervention.
#[endpoint(
    tags("crm"),
    summary = "Get CRM Intervention Report",
    security(("portal_token" = []))
)]
pub(crate) async fn report(
    intervention_id: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention = checked_intervention(&intervention_id)?;

    let body = state
        .app
        .crm
        .intervention_report(intervention, &session.artisan_id)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CrmReportRequest {
    pub content: Option<String>,

    #[serde(default)]
    pub photos: Vec<String>,

    /// Defaults to `submitted`
    pub status: Option<String>,
}

/// Push a report straight to the CRM.
#[endpoint(
    tags("crm"),
    summary = "Submit CRM Intervention Report",
    security(("portal_token" = []))
)]
pub(crate) async fn submit_report(
    intervention_id: PathParam<String>,
    json: JsonBody<CrmReportRequest>,
    depot: &mut Depot,
) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention = checked_intervention(&intervention_id)?;
    let request = json.into_inner();

    let Some(content) = request.content.filter(|content| !content.trim().is_empty()) else {
        return Err(ApiError::bad_request("missing_content", "content required"));
    };

    let payload = json!({
        "content": content,
        "photos": request.photos,
        "status": request.status.as_deref().unwrap_or(DEFAULT_REPORT_STATUS),
    });

    let body = state
        .app
        .crm
        .submit_intervention_report(intervention, &session.artisan_id, payload)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use portal_app::crm::{CrmError, MockCrmClient};

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(crm: MockCrmClient) -> Service {
        TestApp::new().crm(crm).portal_service(
            Router::with_path("crm/interventions")
                .get(index)
                .push(
                    Router::with_path("{intervention_id}")
                        .get(show)
                        .push(Router::with_path("documents").get(documents))
                        .push(Router::with_path("report").get(report).post(submit_report)),
                ),
        )
    }

    #[tokio::test]
    async fn lists_interventions_of_the_session_artisan() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_artisan_interventions()
            .once()
            .withf(|artisan| artisan == "ART-1")
            .return_once(|_| Ok(json!({ "interventions": [{ "id": "INT-1" }] })));

        let mut res = TestClient::get("http://example.com/crm/interventions")
            .send(&make_service(crm))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "interventions": [{ "id": "INT-1" }] }));

        Ok(())
    }

    #[tokio::test]
    async fn detail_is_scoped_to_the_session_artisan() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_intervention_detail()
            .once()
            .withf(|intervention, artisan| intervention == "INT-9" && artisan == "ART-1")
            .return_once(|_, _| Ok(json!({ "id": "INT-9" })));

        let res = TestClient::get("http://example.com/crm/interventions/INT-9?artisanId=ART-2")
            .send(&make_service(crm))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn unsafe_intervention_ids_never_reach_the_crm() -> TestResult {
        let mut res = TestClient::get("http://example.com/crm/interventions/INT%20A/documents")
            .send(&make_service(MockCrmClient::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("invalid_intervention"));

        Ok(())
    }

    #[tokio::test]
    async fn crm_failures_become_bad_gateway() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_intervention_report().once().return_once(|_, _| {
            Err(CrmError::UnexpectedResponse {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let mut res = TestClient::get("http://example.com/crm/interventions/INT-1/report")
            .send(&make_service(crm))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_GATEWAY));
        assert_eq!(body["upstream_status"], json!(500));

        Ok(())
    }

    #[tokio::test]
    async fn report_submission_defaults_status() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_submit_intervention_report()
            .once()
            .withf(|intervention, artisan, payload| {
                intervention == "INT-1"
                    && artisan == "ART-1"
                    && *payload
                        == json!({ "content": "Done", "photos": ["p1"], "status": "submitted" })
            })
            .return_once(|_, _, _| Ok(json!({ "ok": true })));

        let mut res = TestClient::post("http://example.com/crm/interventions/INT-1/report")
            .json(&json!({ "content": "Done", "photos": ["p1"], "token": "ignored" }))
            .send(&make_service(crm))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "ok": true }));

        Ok(())
    }

    #[tokio::test]
    async fn report_submission_requires_content() -> TestResult {
        let mut res = TestClient::post("http://example.com/crm/interventions/INT-1/report")
            .json(&json!({ "content": "  " }))
            .send(&make_service(MockCrmClient::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("missing_content"));

        Ok(())
    }
}
