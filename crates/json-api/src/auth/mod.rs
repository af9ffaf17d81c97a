//! Authentication
//!
//! Two credentials guard the API: tenant API keys for the `/v1` surface and
//! portal tokens for the artisan-facing `/portal` surface.

mod errors;
pub(crate) mod portal;
pub(crate) mod tenant;

pub(crate) use errors::*;
pub(crate) use portal::PortalAuth;
pub(crate) use tenant::TenantAuth;
