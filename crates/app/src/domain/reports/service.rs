//! Intervention reports: draft generation and submission.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    crm::{CrmClient, ReportSubmittedNotice},
    database::Db,
    dispatch::Dispatcher,
    domain::{
        audit::{AuditAction, NewAuditEntry, PgAuditRepository},
        photos::{repository::PgPhotosRepository, service::sign_photos},
        portal_tokens::records::PortalSession,
        reports::{
            content::{artisan_name, render_report},
            errors::ReportsServiceError,
            records::{ReportRecord, ReportStatus, ReportUuid, SubmittedReport},
            repository::PgReportsRepository,
        },
        submissions::{
            data::NewSubmission, records::SubmissionKind, repository::PgSubmissionsRepository,
        },
        tenants::records::TenantUuid,
        uploads::is_safe_path_segment,
    },
    storage::ObjectStore,
};

/// [`ReportsService`] backed by Postgres, the object store and the CRM.
#[derive(Clone)]
pub struct PgReportsService {
    db: Db,
    store: Arc<dyn ObjectStore>,
    crm: Arc<dyn CrmClient>,
    dispatcher: Dispatcher,
    repository: PgReportsRepository,
    photos: PgPhotosRepository,
    submissions: PgSubmissionsRepository,
    audit: PgAuditRepository,
}

impl PgReportsService {
    /// Build the service.
    #[must_use]
    pub fn new(
        db: Db,
        store: Arc<dyn ObjectStore>,
        crm: Arc<dyn CrmClient>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            db,
            store,
            crm,
            dispatcher,
            repository: PgReportsRepository::new(),
            photos: PgPhotosRepository::new(),
            submissions: PgSubmissionsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }
}

impl std::fmt::Debug for PgReportsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgReportsService")
            .field("db", &self.db)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReportsService for PgReportsService {
    async fn latest_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<Option<ReportRecord>, ReportsServiceError> {
        let intervention_id = checked_intervention(intervention_id)?;

        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let report = self
            .repository
            .find_latest_report(
                &mut tx,
                session.tenant_uuid,
                &session.artisan_id,
                intervention_id,
                false,
            )
            .await?;

        tx.commit().await?;

        Ok(report)
    }

    async fn generate_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<ReportRecord, ReportsServiceError> {
        let intervention_id = checked_intervention(intervention_id)?;

        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let photos = self
            .photos
            .list_intervention_photos(&mut tx, session, intervention_id)
            .await?;

        if photos.is_empty() {
            return Err(ReportsServiceError::NoPhotos);
        }

        let content = render_report(
            intervention_id,
            artisan_name(&session.metadata),
            Timestamp::now(),
            &photos,
        );

        let photo_uuids: Vec<Uuid> = photos.iter().map(|photo| photo.uuid.into_uuid()).collect();

        let report = self
            .repository
            .upsert_draft(&mut tx, session, intervention_id, &content, &photo_uuids)
            .await?;

        tx.commit().await?;

        Ok(report)
    }

    async fn submit_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
        report: ReportUuid,
    ) -> Result<ReportRecord, ReportsServiceError> {
        let intervention_id = checked_intervention(intervention_id)?;

        let mut tx = self.db.begin_tenant_transaction(session.tenant_uuid).await?;

        let current = self
            .repository
            .lock_report(&mut tx, session, intervention_id, report)
            .await?
            .ok_or(ReportsServiceError::NotFound)?;

        if current.status == ReportStatus::Submitted {
            return Err(ReportsServiceError::AlreadySubmitted);
        }

        let snapshot: Vec<Uuid> = current
            .photo_uuids
            .iter()
            .map(|photo| photo.into_uuid())
            .collect();

        let photos = self
            .photos
            .find_photos_by_uuids(&mut tx, session.tenant_uuid, &session.artisan_id, &snapshot)
            .await?;

        let submitted = self
            .repository
            .submit_report(&mut tx, session.tenant_uuid, report)
            .await?;

        let photo_ids: Vec<Uuid> = photos.iter().map(|photo| photo.uuid.into_uuid()).collect();

        self.submissions
            .append(
                &mut tx,
                NewSubmission {
                    session,
                    kind: SubmissionKind::Report,
                    intervention_id: Some(intervention_id),
                    data: json!({
                        "report_id": submitted.uuid,
                        "content": submitted.content,
                        "photo_ids": photo_ids,
                        "photo_count": photo_ids.len(),
                    }),
                    storage_paths: photos
                        .iter()
                        .map(|photo| photo.storage_path.clone())
                        .collect(),
                },
            )
            .await?;

        self.photos
            .mark_photos_synced(&mut tx, session.tenant_uuid, &session.artisan_id, &photo_ids)
            .await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(
                    session.tenant_uuid,
                    AuditAction::ReportSubmitted,
                    "intervention_report",
                )
                .resource(submitted.uuid)
                .details(json!({
                    "crm_artisan_id": session.artisan_id,
                    "crm_intervention_id": intervention_id,
                    "photo_count": photo_ids.len(),
                })),
            )
            .await?;

        tx.commit().await?;

        info!(
            tenant = %session.tenant_uuid,
            artisan = %session.artisan_id,
            report = %submitted.uuid,
            "report submitted"
        );

        let crm = Arc::clone(&self.crm);
        let intervention = intervention_id.to_string();
        let notice = ReportSubmittedNotice {
            artisan_id: session.artisan_id.clone(),
            report_id: submitted.uuid.to_string(),
            report_content: submitted.content.clone(),
            photo_count: photo_ids.len(),
        };

        self.dispatcher
            .dispatch("crm_report_notification", async move {
                crm.notify_report_submitted(&intervention, &notice).await
            })
            .await;

        Ok(submitted)
    }

    async fn submitted_report(
        &self,
        tenant: TenantUuid,
        artisan_id: &str,
        intervention_id: &str,
    ) -> Result<Option<SubmittedReport>, ReportsServiceError> {
        let intervention_id = checked_intervention(intervention_id)?;

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let Some(report) = self
            .repository
            .find_latest_report(&mut tx, tenant, artisan_id, intervention_id, true)
            .await?
        else {
            tx.commit().await?;

            return Ok(None);
        };

        let snapshot: Vec<Uuid> = report
            .photo_uuids
            .iter()
            .map(|photo| photo.into_uuid())
            .collect();

        let photos = self
            .photos
            .find_photos_by_uuids(&mut tx, tenant, artisan_id, &snapshot)
            .await?;

        tx.commit().await?;

        let photos = sign_photos(self.store.as_ref(), photos).await;

        Ok(Some(SubmittedReport { report, photos }))
    }
}

fn checked_intervention(intervention_id: &str) -> Result<&str, ReportsServiceError> {
    let intervention_id = intervention_id.trim();

    if intervention_id.is_empty() {
        return Err(ReportsServiceError::MissingIntervention);
    }

    if !is_safe_path_segment(intervention_id) {
        return Err(ReportsServiceError::InvalidIntervention);
    }

    Ok(intervention_id)
}

/// Intervention report operations.
#[automock]
#[async_trait]
pub trait ReportsService: Send + Sync {
    /// The intervention's most recent report in any status.
    ///
    /// # Errors
    ///
    /// Returns [`ReportsServiceError`] for an invalid intervention id or a failed query.
    async fn latest_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<Option<ReportRecord>, ReportsServiceError>;

    /// Generate the draft from the intervention's photos, overwriting an existing draft.
    ///
    /// # Errors
    ///
    /// Returns [`ReportsServiceError::NoPhotos`] when the intervention has no photos.
    async fn generate_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
    ) -> Result<ReportRecord, ReportsServiceError>;

    /// Submit a draft. Submitted reports are immutable.
    ///
    /// # Errors
    ///
    /// Returns [`ReportsServiceError::AlreadySubmitted`] for a submitted report and `NotFound` for another artisan's.
    async fn submit_report(
        &self,
        session: &PortalSession,
        intervention_id: &str,
        report: ReportUuid,
    ) -> Result<ReportRecord, ReportsServiceError>;

    /// The latest submitted report for a tenant's artisan, with signed photo links.
    ///
    /// # Errors
    ///
    /// Returns [`ReportsServiceError`] when the query fails.
    async fn submitted_report(
        &self,
        tenant: TenantUuid,
        artisan_id: &str,
        intervention_id: &str,
    ) -> Result<Option<SubmittedReport>, ReportsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            photos::{PhotosService, data::NewPhoto},
            portal_tokens::{
                PortalTokensService,
                data::{NewPortalToken, PortalTokenRequirement},
            },
            submissions::{SubmissionsService, data::SubmissionQuery},
        },
        test::{TestContext, helpers::jpeg},
    };

    use super::*;

    async fn upload(ctx: &TestContext, session: &PortalSession, intervention: &str) -> TestResult {
        ctx.photos
            .upload_photo(
                session,
                NewPhoto {
                    intervention_id: intervention.to_string(),
                    comment: None,
                    file: jpeg("site.jpg"),
                },
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn generate_requires_a_photo() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        let result = ctx.reports.generate_report(&session, "INT-1").await;

        assert!(matches!(result, Err(ReportsServiceError::NoPhotos)));
        assert_eq!(ctx.reports.latest_report(&session, "INT-1").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn regenerating_updates_the_single_draft() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        upload(&ctx, &session, "INT-1").await?;

        let first = ctx.reports.generate_report(&session, "INT-1").await?;

        upload(&ctx, &session, "INT-1").await?;

        let second = ctx.reports.generate_report(&session, "INT-1").await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(second.status, ReportStatus::Draft);
        assert_eq!(first.photo_uuids.len(), 1);
        assert_eq!(second.photo_uuids.len(), 2);
        assert!(second.content.contains("PHOTOS JOINTES (2)"));
        assert_eq!(ctx.report_count(ctx.tenant_uuid, "A1", "INT-1").await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn submit_appends_ledger_entry_and_locks_photos() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        upload(&ctx, &session, "INT-1").await?;

        let draft = ctx.reports.generate_report(&session, "INT-1").await?;
        let submitted = ctx
            .reports
            .submit_report(&session, "INT-1", draft.uuid)
            .await?;

        assert_eq!(submitted.status, ReportStatus::Submitted);
        assert!(submitted.submitted_at.is_some());

        let page = ctx
            .submissions
            .list_submissions(ctx.tenant_uuid, SubmissionQuery::default())
            .await?;

        let report_entry = page
            .submissions
            .iter()
            .find(|entry| entry.kind == SubmissionKind::Report)
            .ok_or("report ledger entry missing")?;

        assert_eq!(report_entry.data["report_id"], json!(draft.uuid));
        assert_eq!(report_entry.data["photo_count"], json!(1));
        assert_eq!(report_entry.data["content"], json!(draft.content));
        assert_eq!(report_entry.storage_paths.len(), 1);

        let photos = ctx.photos.list_photos(&session, "INT-1").await?;

        assert!(photos.iter().all(|signed| signed.photo.synced_to_crm));
        assert_eq!(ctx.audit_actions(ctx.tenant_uuid).await, ["report.submitted"]);

        Ok(())
    }

    #[tokio::test]
    async fn resubmitting_fails_and_keeps_content() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        upload(&ctx, &session, "INT-1").await?;

        let draft = ctx.reports.generate_report(&session, "INT-1").await?;

        ctx.reports
            .submit_report(&session, "INT-1", draft.uuid)
            .await?;

        let again = ctx.reports.submit_report(&session, "INT-1", draft.uuid).await;

        assert!(matches!(again, Err(ReportsServiceError::AlreadySubmitted)));

        let latest = ctx
            .reports
            .latest_report(&session, "INT-1")
            .await?
            .ok_or("report missing")?;

        assert_eq!(latest.content, draft.content);

        Ok(())
    }

    #[tokio::test]
    async fn submit_is_scoped_to_the_owning_artisan_and_intervention() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.portal_session(ctx.tenant_uuid, "A1").await;
        let stranger = ctx.portal_session(ctx.tenant_uuid, "A2").await;

        upload(&ctx, &owner, "INT-1").await?;

        let draft = ctx.reports.generate_report(&owner, "INT-1").await?;

        let wrong_artisan = ctx.reports.submit_report(&stranger, "INT-1", draft.uuid).await;
        let wrong_intervention = ctx.reports.submit_report(&owner, "INT-2", draft.uuid).await;
        let unknown = ctx
            .reports
            .submit_report(&owner, "INT-1", ReportUuid::new())
            .await;

        assert!(matches!(wrong_artisan, Err(ReportsServiceError::NotFound)));
        assert!(matches!(wrong_intervention, Err(ReportsServiceError::NotFound)));
        assert!(matches!(unknown, Err(ReportsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn submit_notifies_crm_after_commit() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        upload(&ctx, &session, "INT-1").await?;

        let draft = ctx.reports.generate_report(&session, "INT-1").await?;

        ctx.reports
            .submit_report(&session, "INT-1", draft.uuid)
            .await?;

        let notices = ctx.crm.notices();

        let [(intervention, notice)] = notices.as_slice() else {
            panic!("expected one notification, got {}", notices.len());
        };

        assert_eq!(intervention, "INT-1");
        assert_eq!(notice.artisan_id, "A1");
        assert_eq!(notice.report_id, draft.uuid.to_string());
        assert_eq!(notice.photo_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn crm_failure_does_not_fail_submission() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        upload(&ctx, &session, "INT-1").await?;

        let draft = ctx.reports.generate_report(&session, "INT-1").await?;

        ctx.crm.fail_notifications();

        let submitted = ctx
            .reports
            .submit_report(&session, "INT-1", draft.uuid)
            .await?;

        assert_eq!(submitted.status, ReportStatus::Submitted);

        Ok(())
    }

    #[tokio::test]
    async fn tenant_fetch_returns_latest_submitted_report_with_photos() -> TestResult {
        let ctx = TestContext::new().await;
        let session = ctx.portal_session(ctx.tenant_uuid, "A1").await;

        assert_eq!(
            ctx.reports
                .submitted_report(ctx.tenant_uuid, "A1", "INT-1")
                .await?,
            None
        );

        upload(&ctx, &session, "INT-1").await?;

        let draft = ctx.reports.generate_report(&session, "INT-1").await?;

        assert_eq!(
            ctx.reports
                .submitted_report(ctx.tenant_uuid, "A1", "INT-1")
                .await?,
            None,
            "drafts are not visible to the tenant"
        );

        ctx.reports
            .submit_report(&session, "INT-1", draft.uuid)
            .await?;

        let fetched = ctx
            .reports
            .submitted_report(ctx.tenant_uuid, "A1", "INT-1")
            .await?
            .ok_or("submitted report missing")?;

        assert_eq!(fetched.report.uuid, draft.uuid);
        assert_eq!(fetched.photos.len(), 1);
        assert!(fetched.photos.iter().all(|signed| signed.url.is_some()));

        let other_tenant = ctx.create_tenant("Other").await;

        assert_eq!(
            ctx.reports
                .submitted_report(other_tenant, "A1", "INT-1")
                .await?,
            None
        );

        Ok(())
    }

    /// Token issue, photo upload, draft, submit.
    #[tokio::test]
    async fn artisan_submits_a_report_end_to_end() -> TestResult {
        let ctx = TestContext::new().await;

        let issued = ctx
            .portal_tokens
            .issue_token(ctx.tenant_uuid, NewPortalToken::for_artisan("A1"))
            .await?;

        let session = ctx
            .portal_tokens
            .authenticate(Some(issued.token.expose()), PortalTokenRequirement::Any)
            .await?;

        upload(&ctx, &session, "INT-9").await?;

        let page = ctx
            .submissions
            .list_submissions(ctx.tenant_uuid, SubmissionQuery::default())
            .await?;

        assert_eq!(page.submissions.len(), 1);
        assert_eq!(page.submissions.first().map(|entry| entry.kind), Some(SubmissionKind::Photo));

        let draft = ctx.reports.generate_report(&session, "INT-9").await?;

        assert_eq!(draft.status, ReportStatus::Draft);

        let submitted = ctx
            .reports
            .submit_report(&session, "INT-9", draft.uuid)
            .await?;

        assert_eq!(submitted.status, ReportStatus::Submitted);

        let page = ctx
            .submissions
            .list_submissions(ctx.tenant_uuid, SubmissionQuery::default())
            .await?;

        let kinds: Vec<SubmissionKind> = page.submissions.iter().map(|entry| entry.kind).collect();

        assert_eq!(kinds, [SubmissionKind::Photo, SubmissionKind::Report]);

        let photos = ctx.photos.list_photos(&session, "INT-9").await?;

        assert!(photos.iter().all(|signed| signed.photo.synced_to_crm));

        Ok(())
    }
}
