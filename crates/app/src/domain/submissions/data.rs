//! Submission Data

use jiff::Timestamp;
use serde_json::Value;

use crate::domain::{
    portal_tokens::records::PortalSession,
    submissions::records::{SubmissionKind, SubmissionUuid},
};

/// Default page size of a ledger pull.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Hard ceiling on a ledger pull.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Hard ceiling on ids acknowledged per call.
pub const MAX_ACK_BATCH: usize = 100;

/// Ledger pull filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionQuery {
    /// Only entries created strictly after this instant.
    pub since: Option<Timestamp>,

    /// Id of the last entry already seen at exactly `since`. Entries sharing
    /// that instant and sorting after it are included, so a page boundary
    /// between entries with equal `created_at` loses nothing.
    pub after: Option<SubmissionUuid>,

    /// Only entries not yet acknowledged.
    pub unsynced: bool,

    /// Requested page size, clamped by [`SubmissionQuery::page_size`].
    pub limit: u32,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            since: None,
            after: None,
            unsynced: true,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SubmissionQuery {
    /// Requested limit, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// A ledger entry to append on behalf of an artisan.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission<'a> {
    /// Artisan on whose behalf the entry is written.
    pub session: &'a PortalSession,
    /// Artifact kind.
    pub kind: SubmissionKind,
    /// Intervention, when the artifact belongs to one.
    pub intervention_id: Option<&'a str>,
    /// Artifact snapshot.
    pub data: Value,
    /// Object keys the entry refers to.
    pub storage_paths: Vec<String>,
}
