//! Submission Index Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use portal_app::domain::submissions::{
    data::{DEFAULT_PAGE_SIZE, SubmissionQuery},
    records::{SubmissionRecord, SubmissionUuid},
};

use crate::{
    errors::ApiError, extensions::*, state::State, submissions::errors::into_api_error,
};

/// Submission Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubmissionResponse {
    pub id: Uuid,

    /// `photo`, `report` or `document`
    #[serde(rename = "type")]
    pub kind: String,

    pub crm_artisan_id: String,
    pub crm_intervention_id: Option<String>,

    /// Snapshot of the artifact when it was submitted
    #[salvo(schema(value_type = Object))]
    pub data: Value,

    pub storage_paths: Vec<String>,
    pub synced_to_crm: bool,
    pub created_at: String,
}

impl From<SubmissionRecord> for SubmissionResponse {
    fn from(record: SubmissionRecord) -> Self {
        Self {
            id: record.uuid.into_uuid(),
            kind: record.kind.to_string(),
            crm_artisan_id: record.crm_artisan_id,
            crm_intervention_id: record.crm_intervention_id,
            data: record.data,
            storage_paths: record.storage_paths,
            synced_to_crm: record.synced_to_crm,
            created_at: record.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubmissionsResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub count: usize,

    /// The page is full; pull again with `since` and `after` set to the last
    /// entry's `created_at` and `id`
    pub has_more: bool,
}

fn parse_query(
    since: Option<&str>,
    after: Option<&str>,
    unsynced: Option<&str>,
    limit: Option<&str>,
) -> Result<SubmissionQuery, ApiError> {
    let since = since
        .map(str::parse::<Timestamp>)
        .transpose()
        .map_err(|source| {
            ApiError::bad_request(
                "invalid_since",
                format!("since must be an RFC 3339 timestamp: {source}"),
            )
        })?;

    let after = after
        .map(str::parse::<Uuid>)
        .transpose()
        .map_err(|source| {
            ApiError::bad_request("invalid_after", format!("after must be a UUID: {source}"))
        })?
        .map(SubmissionUuid::from_uuid);

    let limit = limit
        .map(str::parse::<u32>)
        .transpose()
        .map_err(|source| {
            ApiError::bad_request(
                "invalid_limit",
                format!("limit must be a positive integer: {source}"),
            )
        })?
        .unwrap_or(DEFAULT_PAGE_SIZE);

    Ok(SubmissionQuery {
        since,
        after,
        unsynced: unsynced != Some("false"),
        limit,
    })
}

/// Submission Index Handler
///
/// Pulls the tenant's ledger in creation order. Unsynced entries only unless
/// `unsynced=false`; at most 500 per page. `after` takes the id of the last
/// entry seen at `since`, so entries sharing that instant are not skipped.
#[endpoint(
    tags("submissions"),
    summary = "List Submissions",
    security(("gmbs_key_id" = [], "gmbs_secret" = []))
)]
pub(crate) async fn handler(
    since: QueryParam<String, false>,
    after: QueryParam<String, false>,
    unsynced: QueryParam<String, false>,
    limit: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<SubmissionsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_or_401()?.tenant_uuid();

    let query = parse_query(
        since.as_deref(),
        after.as_deref(),
        unsynced.as_deref(),
        limit.as_deref(),
    )?;

    let page = state
        .app
        .submissions
        .list_submissions(tenant, query)
        .await
        .map_err(into_api_error)?;

    let submissions: Vec<SubmissionResponse> =
        page.submissions.into_iter().map(Into::into).collect();

    Ok(Json(SubmissionsResponse {
        count: submissions.len(),
        submissions,
        has_more: page.has_more,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use portal_app::domain::{
        portal_tokens::records::PortalTokenUuid,
        submissions::{
            MockSubmissionsService, SubmissionsServiceError,
            records::{SubmissionKind, SubmissionPage, SubmissionUuid},
        },
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TestApp};

    use super::*;

    fn make_service(submissions: MockSubmissionsService) -> Service {
        TestApp::new()
            .submissions(submissions)
            .tenant_service(Router::with_path("submissions").get(handler))
    }

    fn make_submission() -> SubmissionRecord {
        SubmissionRecord {
            uuid: SubmissionUuid::from_uuid(Uuid::nil()),
            tenant_uuid: TEST_TENANT_UUID,
            portal_token_uuid: PortalTokenUuid::from_uuid(Uuid::nil()),
            crm_artisan_id: "ART-1".to_string(),
            crm_intervention_id: Some("INT-1".to_string()),
            kind: SubmissionKind::Photo,
            data: json!({ "photo_id": "p1" }),
            storage_paths: vec!["t/ART-1/interventions/INT-1/photo_1.jpg".to_string()],
            synced_to_crm: false,
            created_at: Timestamp::UNIX_EPOCH,
            synced_at: None,
        }
    }

    #[tokio::test]
    async fn defaults_to_unsynced_first_page() -> TestResult {
        let mut submissions = MockSubmissionsService::new();

        submissions
            .expect_list_submissions()
            .once()
            .withf(|tenant, query| {
                *tenant == TEST_TENANT_UUID && *query == SubmissionQuery::default()
            })
            .return_once(|_, _| {
                Ok(SubmissionPage {
                    submissions: vec![make_submission()],
                    has_more: false,
                })
            });

        let mut res = TestClient::get("http://example.com/submissions")
            .send(&make_service(submissions))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["has_more"], json!(false));
        assert_eq!(body["submissions"][0]["type"], json!("photo"));
        assert_eq!(body["submissions"][0]["data"], json!({ "photo_id": "p1" }));

        Ok(())
    }

    #[tokio::test]
    async fn query_parameters_are_forwarded() -> TestResult {
        let since: Timestamp = "2024-05-01T10:00:00Z".parse()?;

        let mut submissions = MockSubmissionsService::new();

        submissions
            .expect_list_submissions()
            .once()
            .withf(move |_, query| {
                *query
                    == SubmissionQuery {
                        since: Some(since),
                        after: Some(SubmissionUuid::from_uuid(Uuid::nil())),
                        unsynced: false,
                        limit: 2,
                    }
            })
            .return_once(|_, _| {
                Ok(SubmissionPage {
                    submissions: vec![make_submission(), make_submission()],
                    has_more: true,
                })
            });

        let mut res = TestClient::get(
            "http://example.com/submissions?since=2024-05-01T10:00:00Z\
             &after=00000000-0000-0000-0000-000000000000&unsynced=false&limit=2",
        )
        .send(&make_service(submissions))
        .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["count"], json!(2));
        assert_eq!(body["has_more"], json!(true));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_since_is_rejected() -> TestResult {
        let mut res = TestClient::get("http://example.com/submissions?since=yesterday")
            .send(&make_service(MockSubmissionsService::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("invalid_since"));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_after_is_rejected() -> TestResult {
        let mut res = TestClient::get("http://example.com/submissions?after=last")
            .send(&make_service(MockSubmissionsService::new()))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("invalid_after"));

        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_are_hidden() -> TestResult {
        let mut submissions = MockSubmissionsService::new();

        submissions
            .expect_list_submissions()
            .once()
            .return_once(|_, _| Err(SubmissionsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::get("http://example.com/submissions")
            .send(&make_service(submissions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
