//! Upload Document Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_app::domain::{
    documents::records::{DocumentKind, DocumentRecord},
    uploads::UploadError,
};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::{
        documents::errors::into_api_error,
        upload::{form_text, uploaded_file},
        upload_error,
    },
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentResponse {
    pub id: Uuid,
    pub kind: String,
    pub filename: String,
    pub uploaded_at: String,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(document: DocumentRecord) -> Self {
        Self {
            id: document.uuid.into_uuid(),
            kind: document.kind.to_string(),
            filename: document.original_filename,
            uploaded_at: document.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DocumentUploadedResponse {
    pub success: bool,
    pub document: DocumentResponse,
}

/// Upload Document Handler
///
/// Multipart form with `kind` and `file` (images or PDF, at most 10 MiB).
/// Replaces the previous document of the same kind.
#[endpoint(
    tags("portal"),
    summary = "Upload Document",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<DocumentUploadedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let kind = form_text(req, "kind")
        .await
        .ok_or_else(|| ApiError::bad_request("missing_kind", "kind required"))?
        .parse::<DocumentKind>()
        .map_err(|error| ApiError::bad_request("invalid_kind", error.to_string()))?;

    let file = uploaded_file(req)
        .await?
        .ok_or_else(|| upload_error(UploadError::Empty))?;

    let document = state
        .app
        .documents
        .upload_document(session, kind, file)
        .await
        .map_err(into_api_error)?;

    Ok(Json(DocumentUploadedResponse {
        success: true,
        document: document.into(),
    }))
}
