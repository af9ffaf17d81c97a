//! Issue Portal Token Handler

use std::{fmt, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use portal_app::domain::portal_tokens::{
    data::{IssuedPortalToken, NewPortalToken},
    metadata::PortalMetadata,
    token::TOKEN_PREFIX_LEN,
};

use crate::{errors::ApiError, extensions::*, state::State, tokens::errors::issue_error};

/// Issue Token Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct IssueTokenRequest {
    /// Artisan identifier in the CRM
    pub crm_artisan_id: Option<String>,

    /// Intervention the token is scoped to
    pub crm_intervention_id: Option<String>,

    /// Flat map of primitive values shown in the portal, e.g. `name`
    #[salvo(schema(value_type = Object))]
    pub metadata: Option<Value>,
}

impl IssueTokenRequest {
    fn into_new_token(self) -> Result<NewPortalToken, ApiError> {
        let metadata = match self.metadata {
            None | Some(Value::Null) => PortalMetadata::new(),
            Some(value) => serde_json::from_value(value).map_err(|source| {
                ApiError::bad_request(
                    "invalid_metadata",
                    format!("metadata must be a flat object of primitives: {source}"),
                )
            })?,
        };

        Ok(NewPortalToken {
            crm_artisan_id: self.crm_artisan_id.unwrap_or_default(),
            crm_intervention_id: self
                .crm_intervention_id
                .filter(|intervention| !intervention.trim().is_empty()),
            metadata,
        })
    }
}

/// Issued Token Response
///
/// The raw token is only ever returned here.
#[derive(Serialize, Deserialize, ToSchema)]
pub(crate) struct IssuedTokenResponse {
    pub token: String,
    pub portal_url: String,
    pub expires_at: String,
    pub created_at: String,
}

// `portal_url` embeds the raw token, so only the token prefix is rendered.
impl fmt::Debug for IssuedTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.token.chars().take(TOKEN_PREFIX_LEN).collect();

        f.debug_struct("IssuedTokenResponse")
            .field("token", &format_args!("{prefix}…"))
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl From<IssuedPortalToken> for IssuedTokenResponse {
    fn from(issued: IssuedPortalToken) -> Self {
        Self {
            token: issued.token.expose().to_string(),
            portal_url: issued.portal_url,
            expires_at: issued.expires_at.to_string(),
            created_at: issued.created_at.to_string(),
        }
    }
}

/// Issue Portal Token Handler
///
/// Issues a portal token for an artisan. Any previously active token of the
/// artisan stops working.
#[endpoint(
    tags("tokens"),
    summary = "Issue Portal Token",
    security(("gmbs_key_id" = [], "gmbs_secret" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Token issued"),
        (status_code = StatusCode::FORBIDDEN, description = "Artisan quota exceeded"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<IssueTokenRequest>,
    depot: &mut Depot,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_or_401()?.tenant_uuid();

    let request = json.into_inner().into_new_token()?;

    let issued = state
        .app
        .portal_tokens
        .issue_token(tenant, request)
        .await
        .map_err(|error| issue_error(error, &state.app.links))?;

    Ok(Json(issued.into()))
}
