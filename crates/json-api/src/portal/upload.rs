//! Multipart form helpers.

use salvo::{Request, handler};

use portal_app::domain::uploads::{MAX_UPLOAD_BYTES, UploadedFile};

use crate::{errors::ApiError, extensions::*};

const FILE_FIELD: &str = "file";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Room for the multipart framing and text fields around the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Raise the body limit on routes taking a file, so oversized files still
/// reach the size check and get a `file_too_large` answer.
#[handler]
pub(crate) async fn upload_limit(req: &mut Request) {
    req.set_secure_max_size(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES);
}

/// A text field of the request form, trimmed, `None` when blank.
pub(super) async fn form_text(req: &mut Request, field: &str) -> Option<String> {
    let value = req.form::<String>(field).await?;
    let value = value.trim();

    (!value.is_empty()).then(|| value.to_string())
}

/// The `file` part of a multipart form, read into memory.
///
/// The size and MIME type are validated by the services.
pub(super) async fn uploaded_file(req: &mut Request) -> Result<Option<UploadedFile>, ApiError> {
    let Some(part) = req.file(FILE_FIELD).await else {
        return Ok(None);
    };

    let original_filename = part.name().unwrap_or(FILE_FIELD).to_string();

    let mime_type = part.content_type().map_or_else(
        || FALLBACK_MIME_TYPE.to_string(),
        |mime| mime.essence_str().to_string(),
    );

    let path = part.path().clone();

    let bytes = tokio::fs::read(&path)
        .await
        .or_500("failed to read uploaded file")?;

    Ok(Some(UploadedFile {
        original_filename,
        mime_type,
        bytes,
    }))
}
