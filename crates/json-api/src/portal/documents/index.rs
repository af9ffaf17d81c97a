//! Document Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use portal_app::domain::documents::records::DocumentStatus;

use crate::{
    errors::ApiError, extensions::*, portal::documents::errors::into_api_error, state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentStatusResponse {
    /// `kbis`, `assurance`, `cni_recto_verso`, `iban` or `decharge_partenariat`
    pub kind: String,

    pub uploaded: bool,
    pub filename: Option<String>,
    pub uploaded_at: Option<String>,
}

impl From<DocumentStatus> for DocumentStatusResponse {
    fn from(status: DocumentStatus) -> Self {
        Self {
            kind: status.kind.to_string(),
            uploaded: status.uploaded,
            filename: status.filename,
            uploaded_at: status.uploaded_at.map(|at| at.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DocumentsResponse {
    pub documents: Vec<DocumentStatusResponse>,
}

/// Document Index Handler
///
/// Upload state of every document kind.
#[endpoint(
    tags("portal"),
    summary = "List Documents",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<DocumentsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let documents = state
        .app
        .documents
        .list_documents(session)
        .await
        .map_err(into_api_error)?;

    Ok(Json(DocumentsResponse {
        documents: documents.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::documents::{MockDocumentsService, records::DocumentKind};

    use crate::test_helpers::{TestApp, portal_session};

    use super::*;

    #[tokio::test]
    async fn lists_every_kind() -> TestResult {
        let mut documents = MockDocumentsService::new();

        documents
            .expect_list_documents()
            .once()
            .withf(|session| *session == portal_session())
            .return_once(|_| {
                Ok(DocumentKind::ALL
                    .into_iter()
                    .map(|kind| DocumentStatus {
                        kind,
                        uploaded: kind == DocumentKind::Kbis,
                        filename: (kind == DocumentKind::Kbis).then(|| "kbis.pdf".to_string()),
                        uploaded_at: (kind == DocumentKind::Kbis).then_some(Timestamp::UNIX_EPOCH),
                    })
                    .collect())
            });

        let service = TestApp::new()
            .documents(documents)
            .portal_service(Router::with_path("documents").get(handler));

        let mut res = TestClient::get("http://example.com/documents")
            .send(&service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["documents"].as_array().map(Vec::len), Some(5));
        assert_eq!(
            body["documents"][0],
            json!({
                "kind": "kbis",
                "uploaded": true,
                "filename": "kbis.pdf",
                "uploadedAt": Timestamp::UNIX_EPOCH.to_string(),
            })
        );
        assert_eq!(body["documents"][1]["uploaded"], json!(false));

        Ok(())
    }
}
