//! Billing Webhook Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use portal_app::domain::billing::{WebhookFailure, WebhookReceipt};

use crate::{errors::ApiError, extensions::*, state::State};

/// Header carrying the provider's `t=...,v1=...` signature.
pub(crate) const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookResponse {
    /// True once the signature was verified
    pub received: bool,

    /// `webhook_not_configured`, `invalid_signature` or `processing_failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<WebhookReceipt> for WebhookResponse {
    fn from(receipt: WebhookReceipt) -> Self {
        Self {
            received: receipt.received,
            error: receipt.error.map(WebhookFailure::as_str).map(str::to_string),
        }
    }
}

/// Billing Webhook Handler
///
/// Every delivery is acknowledged with a 200 so the provider stops retrying;
/// failures are reported in `error`.
#[endpoint(tags("webhooks"), summary = "Billing Webhook")]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let signature = req
        .header::<String>(SIGNATURE_HEADER)
        .filter(|signature| !signature.is_empty());

    let payload = match req.payload().await {
        Ok(payload) => payload.to_vec(),
        Err(error) => {
            warn!("failed to read billing webhook body: {error}");

            return Ok(Json(WebhookReceipt {
                received: false,
                error: Some(WebhookFailure::ProcessingFailed),
            }
            .into()));
        }
    };

    let receipt = state
        .app
        .billing
        .receive_webhook(signature.as_deref(), &payload)
        .await;

    Ok(Json(receipt.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::billing::MockBillingService;

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(billing: MockBillingService) -> Service {
        TestApp::new()
            .billing(billing)
            .public_service(Router::with_path("webhooks/billing").post(handler))
    }

    #[tokio::test]
    async fn forwards_signature_and_raw_body() -> TestResult {
        let mut billing = MockBillingService::new();

        billing
            .expect_receive_webhook()
            .once()
            .withf(|signature, payload| {
                *signature == Some("t=1,v1=abc") && payload == br#"{"type":"invoice.paid"}"#
            })
            .return_once(|_, _| WebhookReceipt {
                received: true,
                error: None,
            });

        let mut res = TestClient::post("http://example.com/webhooks/billing")
            .add_header(SIGNATURE_HEADER, "t=1,v1=abc", true)
            .body(r#"{"type":"invoice.paid"}"#)
            .send(&make_service(billing))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "received": true }));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_deliveries_are_still_acknowledged() -> TestResult {
        let mut billing = MockBillingService::new();

        billing
            .expect_receive_webhook()
            .once()
            .withf(|signature, _| signature.is_none())
            .return_once(|_, _| WebhookReceipt {
                received: false,
                error: Some(WebhookFailure::InvalidSignature),
            });

        let mut res = TestClient::post("http://example.com/webhooks/billing")
            .body("{}")
            .send(&make_service(billing))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body,
            json!({ "received": false, "error": "invalid_signature" })
        );

        Ok(())
    }
}
