//! API keys and tenant authentication

pub mod credentials;
pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::{ApiKeysServiceError, TenantAuthError};
pub use service::*;
