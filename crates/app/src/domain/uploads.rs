//! Validation and naming of uploaded files.

use rand::{RngCore, rngs::OsRng};
use thiserror::Error;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted for photos.
pub const PHOTO_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// MIME types accepted for documents.
pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
    "application/pdf",
];

/// A file received from an artisan.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name given by the uploader.
    pub original_filename: String,
    /// Declared content type.
    pub mime_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("original_filename", &self.original_filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Reasons an upload is refused before storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No bytes were received.
    #[error("file required")]
    Empty,

    /// The file exceeds the size limit.
    #[error("file too large, max size is {max_mib} MiB", max_mib = MAX_UPLOAD_BYTES / 1024 / 1024)]
    TooLarge {
        /// Received size in bytes.
        size: usize,
    },

    /// The MIME type is not on the allow list.
    #[error("unsupported file type `{mime_type}`")]
    UnsupportedType {
        /// Declared MIME type.
        mime_type: String,
    },
}

impl UploadedFile {
    /// Check size and MIME type against an allow-list.
    ///
    /// # Errors
    ///
    /// Returns the first rule the file breaks.
    pub fn validate(&self, allowed: &[&str]) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size: self.bytes.len(),
            });
        }

        if !allowed.contains(&self.mime_type.as_str()) {
            return Err(UploadError::UnsupportedType {
                mime_type: self.mime_type.clone(),
            });
        }

        Ok(())
    }

    /// Extension of the original name, or `fallback` when it has none.
    #[must_use]
    pub fn extension<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.original_filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(fallback)
    }

    /// Size in bytes, as stored in the database.
    #[must_use]
    pub fn size(&self) -> i64 {
        i64::try_from(self.bytes.len()).unwrap_or(i64::MAX)
    }
}

/// Whether `segment` can be embedded in an object path as-is.
#[must_use]
pub fn is_safe_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// 8 random bytes as 16 hex characters, used to keep object names unique.
#[must_use]
pub fn unique_suffix() -> String {
    let mut bytes = [0_u8; 8];

    OsRng.fill_bytes(&mut bytes);

    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, len: usize) -> UploadedFile {
        UploadedFile {
            original_filename: name.to_string(),
            mime_type: mime.to_string(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn accepts_allowed_types_within_size() {
        assert_eq!(file("a.jpg", "image/jpeg", 10).validate(PHOTO_MIME_TYPES), Ok(()));
        assert_eq!(
            file("a.pdf", "application/pdf", 10).validate(DOCUMENT_MIME_TYPES),
            Ok(())
        );
    }

    #[test]
    fn rejects_pdf_as_photo() {
        assert_eq!(
            file("a.pdf", "application/pdf", 10).validate(PHOTO_MIME_TYPES),
            Err(UploadError::UnsupportedType {
                mime_type: "application/pdf".to_string()
            })
        );
    }

    #[test]
    fn rejects_oversized_and_empty_files() {
        assert_eq!(
            file("a.jpg", "image/jpeg", MAX_UPLOAD_BYTES + 1).validate(PHOTO_MIME_TYPES),
            Err(UploadError::TooLarge {
                size: MAX_UPLOAD_BYTES + 1
            })
        );
        assert_eq!(
            file("a.jpg", "image/jpeg", 0).validate(PHOTO_MIME_TYPES),
            Err(UploadError::Empty)
        );
    }

    #[test]
    fn extension_falls_back() {
        assert_eq!(file("site.photo.PNG", "image/png", 1).extension("jpg"), "PNG");
        assert_eq!(file("noext", "image/png", 1).extension("jpg"), "jpg");
        assert_eq!(file("bad.p/ng", "image/png", 1).extension("jpg"), "jpg");
    }

    #[test]
    fn path_segments_reject_traversal() {
        assert!(is_safe_path_segment("INT-2024_001"));
        assert!(!is_safe_path_segment(".."));
        assert!(!is_safe_path_segment("a/b"));
        assert!(!is_safe_path_segment(""));
    }

    #[test]
    fn unique_suffix_is_16_hex() {
        let suffix = unique_suffix();

        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
