//! Subscription status

pub(crate) mod status;
