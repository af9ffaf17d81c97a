//! Billing provider integration: signed webhooks and subscription lookups.

pub mod errors;
pub mod events;
pub mod provider;
pub mod service;
pub mod signature;

pub use errors::BillingError;
pub use service::*;
