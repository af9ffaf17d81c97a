//! CRM Artisan Document Handlers

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{errors::ApiError, extensions::*, portal::crm::crm_error, state::State};

/// Documents the CRM holds for the artisan.
#[endpoint(
    tags("crm"),
    summary = "List CRM Artisan Documents",
    security(("portal_token" = []))
)]
pub(crate) async fn index(depot: &mut Depot) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let body = state
        .app
        .crm
        .artisan_documents(&session.artisan_id)
        .await
        .map_err(crm_error)?;

    Ok(Json(body))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CrmDocumentRequest {
    pub kind: Option<String>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub base64_data: Option<String>,
}

impl CrmDocumentRequest {
    /// Upload payload for the CRM, `None` unless every field is present.
    fn into_payload(self) -> Option<Value> {
        let present = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        Some(json!({
            "kind": present(self.kind)?,
            "filename": present(self.filename)?,
            "mimeType": present(self.mime_type)?,
            "base64Data": present(self.base64_data)?,
        }))
    }
}

/// Upload a document to the CRM for the artisan.
#[endpoint(
    tags("crm"),
    summary = "Upload CRM Artisan Document",
    security(("portal_token" = []))
)]
pub(crate) async fn create(
    json: JsonBody<CrmDocumentRequest>,
    depot: &mut Depot,
) -> Result<Json<Value>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let payload = json.into_inner().into_payload().ok_or_else(|| {
        ApiError::bad_request(
            "missing_fields",
            "kind, filename, mimeType and base64Data are required",
        )
    })?;

    let body = state
        .app
        .crm
        .upload_artisan_document(&session.artisan_id, payload)
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
        TestApp::new()
            .crm(crm)
            .portal_service(Router::with_path("crm/documents").get(index).post(create))
    }

    #[tokio::test]
    async fn lists_the_artisan_documents() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_artisan_documents()
            .once()
            .withf(|artisan| artisan == "ART-1")
            .return_once(|_| Ok(json!({ "documents": [] })));

        let mut res = TestClient::get("http://example.com/crm/documents")
            .send(&make_service(crm))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "documents": [] }));

        Ok(())
    }

    #[tokio::test]
    async fn upload_forwards_fields_without_the_token() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_upload_artisan_document()
            .once()
            .withf(|artisan, payload| {
                artisan == "ART-1"
                    && *payload
                        == json!({
                            "kind": "kbis",
                            "filename": "kbis.pdf",
                            "mimeType": "application/pdf",
                            "base64Data": "JVBERi0=",
                        })
            })
            .return_once(|_, _| Ok(json!({ "id": "DOC-1" })));

        let mut res = TestClient::post("http://example.com/crm/documents")
            .json(&json!({
                "token": "secret",
                "kind": "kbis",
                "filename": "kbis.pdf",
                "mimeType": "application/pdf",
                "base64Data": "JVBERi0=",
            }))
            .send(&make_service(crm))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "id": "DOC-1" }));

        Ok(())
    }

    #[tokio::test]
    async fn upload_requires_every_field() -> TestResult {
        let mut res = TestClient::post("http://example.com/crm/documents")
            .json(&json!({ "kind": "kbis", "filename": "kbis.pdf" }))
            .send(&make_service(MockCrmClient::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("missing_fields"));

        Ok(())
    }

    #[tokio::test]
    async fn transport_failures_become_bad_gateway() -> TestResult {
        let mut crm = MockCrmClient::new();

        crm.expect_artisan_documents().once().return_once(|_| {
            Err(CrmError::UnexpectedResponse {
                status: 503,
                message: "maintenance".to_string(),
            })
        });

        let res = TestClient::get("http://example.com/crm/documents")
            .send(&make_service(crm))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_GATEWAY));

        Ok(())
    }
}
