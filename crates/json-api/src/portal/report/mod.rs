//! Intervention reports

pub(crate) mod errors;
pub(crate) mod generate;
pub(crate) mod get;
pub(crate) mod submit;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_app::domain::reports::records::ReportRecord;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportResponse {
    pub id: Uuid,
    pub content: String,

    /// `draft` or `submitted`
    pub status: String,

    pub photo_count: usize,
    pub generated_at: String,
    pub submitted_at: Option<String>,
}

impl From<ReportRecord> for ReportResponse {
    fn from(report: ReportRecord) -> Self {
        Self {
            id: report.uuid.into_uuid(),
            content: report.content,
            status: report.status.to_string(),
            photo_count: report.photo_uuids.len(),
            generated_at: report.updated_at.to_string(),
            submitted_at: report.submitted_at.map(|at| at.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jiff::Timestamp;
    use uuid::Uuid;

    use portal_app::domain::{
        portal_tokens::records::PortalTokenUuid,
        reports::records::{ReportRecord, ReportStatus, ReportUuid},
    };

    use crate::test_helpers::TEST_TENANT_UUID;

    pub(crate) const REPORT_ID: &str = "0190c3e2-7b1a-7cc4-9d2e-000000000001";

    pub(crate) fn make_report(status: ReportStatus) -> ReportRecord {
        ReportRecord {
            uuid: ReportUuid::from_uuid(Uuid::parse_str(REPORT_ID).unwrap_or_default()),
            tenant_uuid: TEST_TENANT_UUID,
            portal_token_uuid: PortalTokenUuid::from_uuid(Uuid::nil()),
            crm_artisan_id: "ART-1".to_string(),
            crm_intervention_id: "INT-1".to_string(),
            content: "RAPPORT D'INTERVENTION".to_string(),
            photo_uuids: Vec::new(),
            status,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            submitted_at: (status == ReportStatus::Submitted).then_some(Timestamp::UNIX_EPOCH),
        }
    }
}
