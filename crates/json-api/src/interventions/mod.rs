//! Interventions

pub(crate) mod report;
