//! Test Helpers

use crate::domain::uploads::UploadedFile;

/// JPEG start-of-image marker followed by filler.
const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

const PDF_BYTES: &[u8] = b"%PDF-1.7\n%%EOF\n";

pub(crate) fn jpeg(name: &str) -> UploadedFile {
    UploadedFile {
        original_filename: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: JPEG_BYTES.to_vec(),
    }
}

pub(crate) fn pdf(name: &str) -> UploadedFile {
    UploadedFile {
        original_filename: name.to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: PDF_BYTES.to_vec(),
    }
}
