//! Submission Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    domain::{portal_tokens::records::PortalTokenUuid, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Submission UUID
pub type SubmissionUuid = TypedUuid<SubmissionRecord>;

/// Kind of artisan-produced artifact a ledger entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// An uploaded photo.
    Photo,
    /// A submitted report.
    Report,
    /// An uploaded compliance document.
    Document,
}

impl SubmissionKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Report => "report",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission kind that is not recognised.
#[derive(Debug, Error)]
#[error("unknown submission kind `{0}`")]
pub struct UnknownSubmissionKind(String);

impl FromStr for SubmissionKind {
    type Err = UnknownSubmissionKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "photo" => Ok(Self::Photo),
            "report" => Ok(Self::Report),
            "document" => Ok(Self::Document),
            other => Err(UnknownSubmissionKind(other.to_string())),
        }
    }
}

/// Submission Record
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    /// Row id.
    pub uuid: SubmissionUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,
    /// Token the artifact came through.
    pub portal_token_uuid: PortalTokenUuid,
    /// CRM artisan identifier.
    pub crm_artisan_id: String,
    /// CRM intervention identifier.
    pub crm_intervention_id: Option<String>,
    /// Artifact kind.
    pub kind: SubmissionKind,

    /// Snapshot of the artifact at submission time.
    pub data: Value,

    /// Object keys the entry refers to.
    pub storage_paths: Vec<String>,
    /// Whether the tenant acknowledged the entry.
    pub synced_to_crm: bool,
    /// Append time; the pull cursor.
    pub created_at: Timestamp,
    /// Acknowledgement time.
    pub synced_at: Option<Timestamp>,
}

/// One page of a ledger pull.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPage {
    /// Entries in creation order.
    pub submissions: Vec<SubmissionRecord>,

    /// The page is full; continue with `since` and `after` set to the last
    /// entry's `created_at` and id.
    pub has_more: bool,
}
