//! Tenants: CRM customers, their subscription and artisan quota.

pub mod data;
pub mod errors;
pub mod plans;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::TenantsServiceError;
pub use service::*;
