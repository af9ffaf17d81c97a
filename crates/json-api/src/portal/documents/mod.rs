//! Artisan legal documents

pub(crate) mod create;
mod errors;
pub(crate) mod index;
