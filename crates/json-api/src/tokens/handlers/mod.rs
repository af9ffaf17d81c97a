//! Portal Token Handlers

pub(crate) mod create;
pub(crate) mod validate;
