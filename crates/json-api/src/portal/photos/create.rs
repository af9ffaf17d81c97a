//! Upload Photo Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use portal_app::domain::{photos::data::NewPhoto, uploads::UploadError};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::{
        photos::{PhotoResponse, errors::into_api_error},
        upload::{form_text, uploaded_file},
        upload_error,
    },
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PhotoUploadedResponse {
    pub success: bool,
    pub photo: PhotoResponse,
}

/// Upload Photo Handler
///
/// Multipart form with `interventionId`, optional `comment` and `file`
/// (JPEG, PNG, WebP or HEIC, at most 10 MiB).
#[endpoint(
    tags("portal"),
    summary = "Upload Photo",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PhotoUploadedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let intervention_id = form_text(req, "interventionId").await.unwrap_or_default();
    let comment = form_text(req, "comment").await;

    let file = uploaded_file(req)
        .await?
        .ok_or_else(|| upload_error(UploadError::Empty))?;

    let photo = NewPhoto {
        intervention_id,
        comment,
        file,
    };

    let signed = state
        .app
        .photos
        .upload_photo(session, photo)
        .await
        .map_err(into_api_error)?;

    Ok(Json(PhotoUploadedResponse {
        success: true,
        photo: signed.into(),
    }))
}
