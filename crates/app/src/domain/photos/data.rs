//! Photo Data

use crate::domain::uploads::UploadedFile;

/// Photo upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    /// Intervention the photo belongs to.
    pub intervention_id: String,
    /// Caption.
    pub comment: Option<String>,
    /// Uploaded file.
    pub file: UploadedFile,
}
