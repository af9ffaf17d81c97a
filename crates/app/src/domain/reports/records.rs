//! Intervention Report Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    domain::{
        photos::records::{PhotoUuid, SignedPhoto},
        portal_tokens::records::PortalTokenUuid,
        tenants::records::TenantUuid,
    },
    uuids::TypedUuid,
};

/// Intervention Report UUID
pub type ReportUuid = TypedUuid<ReportRecord>;

/// Report lifecycle. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    /// Editable.
    Draft,
    /// Sent to the CRM.
    Submitted,
}

impl ReportStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report status that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown report status `{0}`")]
pub struct UnknownReportStatus(pub String);

impl FromStr for ReportStatus {
    type Err = UnknownReportStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            other => Err(UnknownReportStatus(other.to_string())),
        }
    }
}

/// Intervention Report Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    /// Row id.
    pub uuid: ReportUuid,
    /// Owning tenant.
    pub tenant_uuid: TenantUuid,
    /// Token the report was written through.
    pub portal_token_uuid: PortalTokenUuid,
    /// CRM artisan identifier.
    pub crm_artisan_id: String,
    /// CRM intervention identifier.
    pub crm_intervention_id: String,
    /// Report text.
    pub content: String,
    /// Photos attached when the content was last generated.
    pub photo_uuids: Vec<PhotoUuid>,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last regeneration or submission.
    pub updated_at: Timestamp,
    /// Submission time.
    pub submitted_at: Option<Timestamp>,
}

/// A submitted report with signed links to its photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedReport {
    /// The report.
    pub report: ReportRecord,
    /// Its photos with signed links.
    pub photos: Vec<SignedPhoto>,
}
