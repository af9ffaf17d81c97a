//! Portal Domain Concerns

pub mod api_keys;
pub mod audit;
pub mod billing;
pub mod documents;
pub mod photos;
pub mod portal_tokens;
pub mod reports;
pub mod submissions;
pub mod tenants;
pub mod uploads;
