//! Subscription Status Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use portal_app::domain::tenants::{TenantsServiceError, records::SubscriptionSummary};

use crate::{errors::ApiError, extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ArtisanCount {
    pub artisans: u32,
}

/// Subscription Status Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubscriptionStatusResponse {
    /// Whether the tenant may currently use the API
    pub active: bool,

    /// `trial`, `active`, `cancelled` or `expired`
    pub status: String,

    /// `basic`, `pro` or `enterprise`
    pub plan: String,

    pub limits: ArtisanCount,

    /// Distinct artisans holding an active token
    pub usage: ArtisanCount,

    pub features: Vec<String>,
}

impl From<SubscriptionSummary> for SubscriptionStatusResponse {
    fn from(summary: SubscriptionSummary) -> Self {
        Self {
            active: summary.active,
            status: summary.status.to_string(),
            plan: summary.plan.to_string(),
            limits: ArtisanCount {
                artisans: summary.artisan_limit,
            },
            usage: ArtisanCount {
                artisans: summary.artisans_in_use,
            },
            features: summary.features,
        }
    }
}

fn into_api_error(error: TenantsServiceError) -> ApiError {
    match error {
        TenantsServiceError::NotFound => ApiError::not_found("tenant_not_found", "Tenant not found"),
        other => ApiError::internal("failed to load subscription status", &other),
    }
}

/// Subscription Status Handler
#[endpoint(
    tags("subscription"),
    summary = "Subscription Status",
    security(("gmbs_key_id" = [], "gmbs_secret" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_or_401()?.tenant_uuid();

    let summary = state
        .app
        .tenants
        .subscription_status(tenant)
        .await
        .map_err(into_api_error)?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::tenants::MockTenantsService;

    use crate::test_helpers::{TEST_TENANT_UUID, TestApp, tenant_record};

    use super::*;

    fn make_service(tenants: MockTenantsService) -> Service {
        TestApp::new()
            .tenants(tenants)
            .tenant_service(Router::with_path("subscription/status").get(handler))
    }

    #[tokio::test]
    async fn reports_plan_limits_and_usage() -> TestResult {
        let mut tenants = MockTenantsService::new();

        tenants
            .expect_subscription_status()
            .once()
            .withf(|tenant| *tenant == TEST_TENANT_UUID)
            .return_once(|_| Ok(SubscriptionSummary::new(&tenant_record(), 3)));

        let mut res = TestClient::get("http://example.com/subscription/status")
            .send(&make_service(tenants))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body,
            json!({
                "active": true,
                "status": "active",
                "plan": "pro",
                "limits": { "artisans": 50 },
                "usage": { "artisans": 3 },
                "features": ["tokens", "submissions", "photos", "reports", "api_extended"],
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_tenant_is_not_found() -> TestResult {
        let mut tenants = MockTenantsService::new();

        tenants
            .expect_subscription_status()
            .once()
            .return_once(|_| Err(TenantsServiceError::NotFound));

        let res = TestClient::get("http://example.com/subscription/status")
            .send(&make_service(tenants))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
