//! Validate Portal Token Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use portal_app::domain::portal_tokens::{
    PortalTokenError, data::PortalTokenRequirement, records::PortalSession,
};

use crate::{auth::portal_token_error, errors::ApiError, extensions::*, state::State};

/// Valid Token Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidTokenResponse {
    pub valid: bool,

    /// `crm_id` plus the metadata given at issue time
    #[salvo(schema(value_type = Object))]
    pub artisan: Map<String, Value>,

    pub intervention_id: Option<String>,
}

impl ValidTokenResponse {
    fn new(session: PortalSession) -> Self {
        let mut artisan: Map<String, Value> = session
            .metadata
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), serde_json::to_value(value).ok()?)))
            .collect();

        artisan.insert("crm_id".to_string(), Value::String(session.artisan_id));

        Self {
            valid: true,
            artisan,
            intervention_id: session.intervention_id,
        }
    }
}

fn invalid(error: PortalTokenError) -> ApiError {
    let error = match error {
        PortalTokenError::TokenRequired | PortalTokenError::InvalidToken => {
            ApiError::not_found("token_not_found", "Token not found")
        }
        other => portal_token_error(other),
    };

    error.with("valid", false)
}

/// Validate Portal Token Handler
///
/// Public check used by the portal front-end before rendering. The token
/// itself is never echoed back.
#[endpoint(
    tags("tokens"),
    summary = "Validate Portal Token",
    responses(
        (status_code = StatusCode::OK, description = "Token is valid"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown token"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Revoked or expired token"),
    ),
)]
pub(crate) async fn handler(
    token: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<ValidTokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let session = state
        .app
        .portal_tokens
        .authenticate(Some(token.as_str()), PortalTokenRequirement::Any)
        .await
        .map_err(invalid)?;

    Ok(Json(ValidTokenResponse::new(session)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use portal_app::domain::portal_tokens::MockPortalTokensService;

    use crate::test_helpers::{TestApp, portal_session};

    use super::*;

    fn make_service(tokens: MockPortalTokensService) -> Service {
        TestApp::new()
            .portal_tokens(tokens)
            .public_service(Router::with_path("tokens/{token}/validate").get(handler))
    }

    #[tokio::test]
    async fn valid_token_returns_artisan_context() -> TestResult {
        let mut tokens = MockPortalTokensService::new();

        tokens
            .expect_authenticate()
            .once()
            .withf(|token, requirement| {
                *token == Some("abc123") && *requirement == PortalTokenRequirement::Any
            })
            .return_once(|_, _| Ok(portal_session()));

        let mut res = TestClient::get("http://example.com/tokens/abc123/validate")
            .send(&make_service(tokens))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body,
            json!({
                "valid": true,
                "artisan": { "crm_id": "ART-1", "name": "Jean Dupont" },
                "intervention_id": "INT-1",
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() -> TestResult {
        let mut tokens = MockPortalTokensService::new();

        tokens
            .expect_authenticate()
            .once()
            .return_once(|_, _| Err(PortalTokenError::InvalidToken));

        let mut res = TestClient::get("http://example.com/tokens/nope/validate")
            .send(&make_service(tokens))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
        assert_eq!(body["valid"], json!(false));
        assert_eq!(body["reason"], json!("token_not_found"));

        Ok(())
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() -> TestResult {
        let mut tokens = MockPortalTokensService::new();

        tokens
            .expect_authenticate()
            .once()
            .return_once(|_, _| Err(PortalTokenError::TokenExpired));

        let mut res = TestClient::get("http://example.com/tokens/old/validate")
            .send(&make_service(tokens))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body["valid"], json!(false));
        assert_eq!(body["reason"], json!("token_expired"));

        Ok(())
    }
}
