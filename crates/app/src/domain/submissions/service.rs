//! Submission ledger: pull and acknowledge.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        audit::{AuditAction, NewAuditEntry, PgAuditRepository},
        submissions::{
            data::{MAX_ACK_BATCH, SubmissionQuery},
            errors::SubmissionsServiceError,
            records::SubmissionPage,
            repository::PgSubmissionsRepository,
        },
        tenants::records::TenantUuid,
    },
};

/// [`SubmissionsService`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgSubmissionsService {
    db: Db,
    repository: PgSubmissionsRepository,
    audit: PgAuditRepository,
}

impl PgSubmissionsService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSubmissionsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }
}

#[async_trait]
impl SubmissionsService for PgSubmissionsService {
    async fn list_submissions(
        &self,
        tenant: TenantUuid,
        query: SubmissionQuery,
    ) -> Result<SubmissionPage, SubmissionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let submissions = self
            .repository
            .list_submissions(&mut tx, tenant, &query)
            .await?;

        tx.commit().await?;

        let has_more = submissions.len() == query.page_size() as usize;

        Ok(SubmissionPage {
            submissions,
            has_more,
        })
    }

    async fn mark_synced(
        &self,
        tenant: TenantUuid,
        ids: Vec<String>,
    ) -> Result<u64, SubmissionsServiceError> {
        if ids.is_empty() {
            return Err(SubmissionsServiceError::EmptyBatch);
        }

        if ids.len() > MAX_ACK_BATCH {
            return Err(SubmissionsServiceError::BatchTooLarge);
        }

        let requested: Vec<(String, Option<Uuid>)> = ids
            .into_iter()
            .map(|id| {
                let parsed = Uuid::parse_str(id.trim()).ok();
                (id, parsed)
            })
            .collect();

        let uuids: Vec<Uuid> = requested
            .iter()
            .filter_map(|(_, parsed)| *parsed)
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let owned: FxHashSet<Uuid> = self
            .repository
            .find_owned_submission_uuids(&mut tx, tenant, &uuids)
            .await?
            .into_iter()
            .collect();

        let invalid_ids: Vec<String> = requested
            .iter()
            .filter(|(_, parsed)| !parsed.is_some_and(|uuid| owned.contains(&uuid)))
            .map(|(id, _)| id.clone())
            .collect();

        // The whole batch is refused; nothing is written.
        if !invalid_ids.is_empty() {
            return Err(SubmissionsServiceError::CrossTenantReference { invalid_ids });
        }

        let marked = self
            .repository
            .mark_submissions_synced(&mut tx, tenant, &uuids)
            .await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant, AuditAction::SubmissionsMarkedSynced, "submission")
                    .details(json!({
                        "count": marked,
                        "ids": uuids,
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(tenant = %tenant, requested = uuids.len(), marked, "acknowledged submissions");

        Ok(marked)
    }
}

/// Ledger operations for tenants.
#[automock]
#[async_trait]
pub trait SubmissionsService: Send + Sync {
    /// Pull a tenant's ledger entries in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionsServiceError`] when the query fails.
    async fn list_submissions(
        &self,
        tenant: TenantUuid,
        query: SubmissionQuery,
    ) -> Result<SubmissionPage, SubmissionsServiceError>;

    /// Acknowledge a batch of entries.
    ///
    /// Returns the number of entries that flipped to synced; entries that
    /// were already synced are accepted but not counted.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionsServiceError`] for an empty or oversized batch, or ids the tenant does not own.
    async fn mark_synced(
        &self,
        tenant: TenantUuid,
        ids: Vec<String>,
    ) -> Result<u64, SubmissionsServiceError>;
}
