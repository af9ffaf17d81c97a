//! Tenant API key middleware.

use std::sync::Arc;

use salvo::prelude::*;

use portal_app::domain::api_keys::{
    credentials::{ApiSecret, Scope},
    data::TenantCredentials,
};

use crate::{
    auth::tenant_auth_error, extensions::*, observability::observe_auth_failure, state::State,
};

pub(crate) const KEY_ID_HEADER: &str = "x-gmbs-key-id";
pub(crate) const SECRET_HEADER: &str = "x-gmbs-secret";
pub(crate) const TIMESTAMP_HEADER: &str = "x-gmbs-timestamp";

/// Authenticates the tenant behind the `X-GMBS-*` headers, optionally
/// requiring a scope on the key.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TenantAuth {
    scope: Option<Scope>,
}

impl TenantAuth {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn scoped(scope: Scope) -> Self {
        Self { scope: Some(scope) }
    }
}

#[handler]
impl TenantAuth {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let state = match depot.obtain_or_500::<Arc<State>>() {
            Ok(state) => Arc::clone(state),
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        };

        match state
            .app
            .api_keys
            .authenticate(credentials(req), self.scope)
            .await
        {
            Ok(tenant) => {
                depot.insert_tenant(tenant);
                ctrl.call_next(req, depot, res).await;
            }
            Err(error) => {
                let error = tenant_auth_error(error);

                if !error.status().is_server_error() {
                    observe_auth_failure("tenant", error.reason());
                }

                res.render(error);
                ctrl.skip_rest();
            }
        }
    }
}

fn credentials(req: &Request) -> TenantCredentials {
    TenantCredentials {
        key_id: header(req, KEY_ID_HEADER),
        secret: header(req, SECRET_HEADER).map(ApiSecret::new),
        timestamp: header(req, TIMESTAMP_HEADER),
    }
}

fn header(req: &Request, name: &str) -> Option<String> {
    let value = req.headers().get(name)?.to_str().ok()?.trim();

    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use salvo::{
        affix_state::inject,
        test::{RequestBuilder, ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::api_keys::{MockApiKeysService, TenantAuthError};

    use crate::test_helpers::{TestApp, authenticated_tenant};

    use super::*;

    #[handler]
    async fn echo_tenant(depot: &mut Depot, res: &mut Response) {
        let name = depot
            .tenant_or_401()
            .map_or_else(|_| "missing".to_string(), |auth| auth.tenant.name.clone());

        res.render(name);
    }

    fn make_service(api_keys: MockApiKeysService, auth: TenantAuth) -> Service {
        let state = TestApp::new().api_keys(api_keys).into_state();

        Service::new(
            Router::new()
                .hoop(inject(state))
                .hoop(auth)
                .push(Router::new().get(echo_tenant)),
        )
    }

    fn signed_request() -> RequestBuilder {
        TestClient::get("http://example.com")
            .add_header(KEY_ID_HEADER, "pk_live_abc", true)
            .add_header(SECRET_HEADER, "sk_live_def", true)
            .add_header(TIMESTAMP_HEADER, "1700000000000", true)
    }

    #[tokio::test]
    async fn valid_credentials_inject_the_tenant() -> TestResult {
        let mut api_keys = MockApiKeysService::new();

        api_keys
            .expect_authenticate()
            .once()
            .withf(|credentials, scope| {
                credentials.key_id.as_deref() == Some("pk_live_abc")
                    && credentials.secret.as_ref().map(ApiSecret::expose) == Some("sk_live_def")
                    && credentials.timestamp.as_deref() == Some("1700000000000")
                    && *scope == Some(Scope::TokensWrite)
            })
            .return_once(|_, _| Ok(authenticated_tenant()));

        let mut res = signed_request()
            .send(&make_service(api_keys, TenantAuth::scoped(Scope::TokensWrite)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, "Acme Plumbing");

        Ok(())
    }

    #[tokio::test]
    async fn missing_headers_reach_the_service_as_none() -> TestResult {
        let mut api_keys = MockApiKeysService::new();

        api_keys
            .expect_authenticate()
            .once()
            .withf(|credentials, scope| {
                credentials.key_id.is_none()
                    && credentials.secret.is_none()
                    && credentials.timestamp.is_none()
                    && scope.is_none()
            })
            .return_once(|_, _| Err(TenantAuthError::MissingCredentials));

        let mut res = TestClient::get("http://example.com")
            .add_header(KEY_ID_HEADER, "  ", true)
            .send(&make_service(api_keys, TenantAuth::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body["reason"], json!("missing_credentials"));

        Ok(())
    }

    #[tokio::test]
    async fn insufficient_scope_is_forbidden() -> TestResult {
        let mut api_keys = MockApiKeysService::new();

        api_keys
            .expect_authenticate()
            .once()
            .with(mockall::predicate::always(), eq(Some(Scope::SubmissionsRead)))
            .return_once(|_, _| {
                Err(TenantAuthError::InsufficientScope {
                    required: Scope::SubmissionsRead,
                })
            });

        let mut res = signed_request()
            .send(&make_service(
                api_keys,
                TenantAuth::scoped(Scope::SubmissionsRead),
            ))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
        assert_eq!(body["reason"], json!("insufficient_scope"));
        assert_eq!(body["required_scope"], json!("submissions:read"));

        Ok(())
    }
}
