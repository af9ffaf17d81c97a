//! Incoming provider webhooks

pub(crate) mod billing;
