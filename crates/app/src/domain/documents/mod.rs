//! Artisan legal documents.

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::DocumentsServiceError;
pub use service::*;
