//! Portal Session Handler

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use portal_app::domain::portal_tokens::records::PortalSession;

use crate::{errors::ApiError, extensions::*};

/// The artisan behind the token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    pub artisan_id: String,
    pub intervention_id: Option<String>,

    #[salvo(schema(value_type = Object))]
    pub metadata: Value,
}

impl TryFrom<&PortalSession> for SessionResponse {
    type Error = serde_json::Error;

    fn try_from(session: &PortalSession) -> Result<Self, Self::Error> {
        Ok(Self {
            artisan_id: session.artisan_id.clone(),
            intervention_id: session.intervention_id.clone(),
            metadata: serde_json::to_value(&session.metadata)?,
        })
    }
}

/// Portal Session Handler
#[endpoint(
    tags("portal"),
    summary = "Portal Session",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SessionResponse>, ApiError> {
    let session = depot.portal_session_or_401()?;

    let response = SessionResponse::try_from(session).or_500("failed to render session")?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::TestApp;

    use super::*;

    #[tokio::test]
    async fn returns_the_token_context() -> TestResult {
        let service = TestApp::new().portal_service(Router::with_path("session").get(handler));

        let mut res = TestClient::get("http://example.com/session")
            .send(&service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body,
            json!({
                "artisanId": "ART-1",
                "interventionId": "INT-1",
                "metadata": { "name": "Jean Dupont" },
            })
        );

        Ok(())
    }
}
