//! Mark Submissions Synced Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError, extensions::*, state::State, submissions::errors::into_api_error,
};

/// Mark Synced Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MarkSyncedRequest {
    /// Submission ids, at most 100
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MarkSyncedResponse {
    pub success: bool,

    /// Entries that flipped to synced by this call
    pub marked_count: u64,
}

/// Mark Submissions Synced Handler
///
/// Acknowledges pulled entries. The whole batch is refused when any id is
/// unknown to the tenant.
#[endpoint(
    tags("submissions"),
    summary = "Mark Submissions Synced",
    security(("gmbs_key_id" = [], "gmbs_secret" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Entries acknowledged"),
        (status_code = StatusCode::FORBIDDEN, description = "Ids outside the tenant, see `invalid_ids`"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<MarkSyncedRequest>,
    depot: &mut Depot,
) -> Result<Json<MarkSyncedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_or_401()?.tenant_uuid();

    let marked_count = state
        .app
        .submissions
        .mark_synced(tenant, json.into_inner().ids)
        .await
        .map_err(into_api_error)?;

    Ok(Json(MarkSyncedResponse {
        success: true,
        marked_count,
    }))
}
