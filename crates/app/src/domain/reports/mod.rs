//! Intervention reports: draft generation and submission.

pub mod content;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::ReportsServiceError;
pub use service::*;
