//! Intervention photos

pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::PhotosServiceError;
pub use service::*;
