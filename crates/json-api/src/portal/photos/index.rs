//! Photo Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::photos::{PhotoResponse, errors::into_api_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PhotosResponse {
    pub photos: Vec<PhotoResponse>,
}

/// Photo Index Handler
///
/// Photos of `interventionId`, oldest first, with one-hour signed links.
#[endpoint(
    tags("portal"),
    summary = "List Photos",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PhotosResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention_id = req.query::<String>("interventionId").unwrap_or_default();

    let photos = state
        .app
        .photos
        .list_photos(session, &intervention_id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(PhotosResponse {
        photos: photos.into_iter().map(Into::into).collect(),
    }))
}
