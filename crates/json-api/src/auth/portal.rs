//! Portal token middleware.
//!
//! The token is looked up in the `token` query parameter, then the
//! `X-Portal-Token` header, then (for requests with a body) a `token` form
//! field or JSON member.

use std::sync::Arc;

use salvo::{http::Method, prelude::*};
use serde::Deserialize;

use portal_app::domain::portal_tokens::data::PortalTokenRequirement;

use crate::{
    auth::portal_token_error, extensions::*, observability::observe_auth_failure, state::State,
};

pub(crate) const PORTAL_TOKEN_HEADER: &str = "x-portal-token";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PortalAuth {
    requirement: PortalTokenRequirement,
}

impl PortalAuth {
    #[must_use]
    pub(crate) fn any() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct TokenField {
    token: Option<String>,
}

#[handler]
impl PortalAuth {
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

        let token = extract_token(req).await;

        match state
            .app
            .portal_tokens
            .authenticate(token.as_deref(), self.requirement)
            .await
        {
            Ok(session) => {
                depot.insert_portal_session(session);
                ctrl.call_next(req, depot, res).await;
            }
            Err(error) => {
                let error = portal_token_error(error);

                if !error.status().is_server_error() {
                    observe_auth_failure("portal", error.reason());
                }

                res.render(error);
                ctrl.skip_rest();
            }
        }
    }
}

async fn extract_token(req: &mut Request) -> Option<String> {
    if let Some(token) = req.query::<String>("token").and_then(non_blank) {
        return Some(token);
    }

    if let Some(token) = req.header::<String>(PORTAL_TOKEN_HEADER).and_then(non_blank) {
        return Some(token);
    }

    if !matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return None;
    }

    let is_form = req.content_type().is_some_and(|mime| {
        matches!(
            mime.essence_str(),
            "multipart/form-data" | "application/x-www-form-urlencoded"
        )
    });

    let token = if is_form {
        req.form::<String>("token").await
    } else {
        req.parse_json::<TokenField>()
            .await
            .ok()
            .and_then(|field| field.token)
    };

    token.and_then(non_blank)
}

fn non_blank(token: String) -> Option<String> {
    let token = token.trim();

    (!token.is_empty()).then(|| token.to_string())
}
