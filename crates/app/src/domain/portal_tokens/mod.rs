//! Portal tokens

pub mod data;
pub mod errors;
pub mod metadata;
pub mod records;
pub(crate) mod repository;
pub mod service;
pub mod token;

pub use errors::{PortalTokenError, TokenIssueError};
pub use service::*;
