//! Artisan portal
//!
//! Every route here runs behind [`crate::auth::PortalAuth`]; the tenant and
//! artisan always come from the token, never from the request.

pub(crate) mod crm;
pub(crate) mod documents;
mod errors;
pub(crate) mod photos;
pub(crate) mod report;
pub(crate) mod session;
mod upload;

pub(crate) use errors::*;
pub(crate) use upload::upload_limit;
