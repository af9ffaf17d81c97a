//! Audit Log
//!
//! Append-only record of sensitive actions. Entries are written inside the
//! transaction of the action they describe and are never read back by the
//! application.

use std::fmt;

use serde_json::Value;
use sqlx::{Postgres, Transaction, query};

use crate::{domain::tenants::records::TenantUuid, uuids::TypedUuid};

const INSERT_AUDIT_ENTRY_SQL: &str = include_str!("sql/insert_audit_entry.sql");

/// Audit Entry UUID
pub type AuditEntryUuid = TypedUuid<NewAuditEntry>;

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A portal token was issued.
    TokenCreated,
    /// Ledger entries were acknowledged.
    SubmissionsMarkedSynced,
    /// An artisan submitted a report.
    ReportSubmitted,
    /// A tenant was provisioned from a checkout.
    TenantCreatedViaStripe,
    /// The subscription changed status or plan.
    SubscriptionUpdated,
    /// The subscription ended.
    SubscriptionDeleted,
    /// An invoice payment failed.
    PaymentFailed,
    /// An API key was created.
    ApiKeyCreated,
    /// An API key was revoked.
    ApiKeyRevoked,
}

impl AuditAction {
    /// Stored action name, e.g. `"token.created"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenCreated => "token.created",
            Self::SubmissionsMarkedSynced => "submissions.marked_synced",
            Self::ReportSubmitted => "report.submitted",
            Self::TenantCreatedViaStripe => "tenant.created_via_stripe",
            Self::SubscriptionUpdated => "subscription.updated",
            Self::SubscriptionDeleted => "subscription.deleted",
            Self::PaymentFailed => "payment.failed",
            Self::ApiKeyCreated => "api_key.created",
            Self::ApiKeyRevoked => "api_key.revoked",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit row to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    /// Tenant the action belongs to.
    pub tenant: TenantUuid,
    /// What happened.
    pub action: AuditAction,
    /// Kind of the affected resource.
    pub resource_type: &'static str,
    /// Id of the affected resource.
    pub resource_id: Option<String>,
    /// Free-form JSON context.
    pub details: Value,
}

impl NewAuditEntry {
    /// Entry with no resource id and empty details.
    #[must_use]
    pub fn new(tenant: TenantUuid, action: AuditAction, resource_type: &'static str) -> Self {
        Self {
            tenant,
            action,
            resource_type,
            resource_id: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the affected resource id.
    #[must_use]
    pub fn resource(mut self, resource_id: impl ToString) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    /// Replace the details object.
    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuditRepository;

impl PgAuditRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: NewAuditEntry,
    ) -> Result<(), sqlx::Error> {
        query(INSERT_AUDIT_ENTRY_SQL)
            .bind(AuditEntryUuid::new().into_uuid())
            .bind(entry.tenant.into_uuid())
            .bind(entry.action.as_str())
            .bind(entry.resource_type)
            .bind(entry.resource_id)
            .bind(entry.details)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
