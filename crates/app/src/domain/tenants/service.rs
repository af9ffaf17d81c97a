//! Tenants service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::tenants::{
        data::NewTenant,
        errors::TenantsServiceError,
        records::{SubscriptionSummary, TenantRecord, TenantUuid},
        repository::PgTenantsRepository,
    },
};

/// [`TenantsService`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgTenantsService {
    db: Db,
    repository: PgTenantsRepository,
}

impl PgTenantsService {
    /// Build the service.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgTenantsRepository::new(),
        }
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant.uuid).await?;

        let created = self.repository.create_tenant(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.get_tenant(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn subscription_status(
        &self,
        tenant: TenantUuid,
    ) -> Result<SubscriptionSummary, TenantsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.get_tenant(&mut tx, tenant).await?;
        let in_use = self.repository.count_active_artisans(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(SubscriptionSummary::new(&record, in_use))
    }
}

#[automock]
#[async_trait]
/// Tenant persistence operations.
pub trait TenantsService: Send + Sync {
    /// Creates a new tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TenantsServiceError::AlreadyExists`] on a duplicate.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError>;

    /// Loads a tenant by UUID.
    ///
    /// # Errors
    ///
    /// Returns [`TenantsServiceError::NotFound`] for an unknown tenant.
    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError>;

    /// Current plan, quota usage and entitlement of a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TenantsServiceError::NotFound`] for an unknown tenant.
    async fn subscription_status(
        &self,
        tenant: TenantUuid,
    ) -> Result<SubscriptionSummary, TenantsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        domain::{
            portal_tokens::{PortalTokensService, data::NewPortalToken},
            tenants::plans::{SubscriptionPlan, SubscriptionStatus},
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_tenant_returns_correct_uuid_and_name() -> TestResult {
        let ctx = TestContext::new().await;

        let uuid = TenantUuid::new();

        let tenant = ctx
            .tenants
            .create_tenant(NewTenant::trial(uuid, "Acme Corp"))
            .await?;

        assert_eq!(tenant.uuid, uuid);
        assert_eq!(tenant.name, "Acme Corp");
        assert_eq!(tenant.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(tenant.subscription_plan, SubscriptionPlan::Basic);
        assert_eq!(tenant.allowed_artisans, 10);
        assert!(tenant.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn create_tenant_timestamps_are_set() -> TestResult {
        let ctx = TestContext::new().await;

        let before = Timestamp::now();

        let tenant = ctx
            .tenants
            .create_tenant(NewTenant::trial(TenantUuid::new(), "Timestamp Test"))
            .await?;

        let after = Timestamp::now();

        assert!(tenant.created_at >= before);
        assert!(tenant.created_at <= after);

        Ok(())
    }

    #[tokio::test]
    async fn create_tenant_duplicate_uuid_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        let uuid = TenantUuid::new();

        ctx.tenants
            .create_tenant(NewTenant::trial(uuid, "First"))
            .await?;

        let result = ctx
            .tenants
            .create_tenant(NewTenant::trial(uuid, "Second"))
            .await;

        assert!(
            matches!(result, Err(TenantsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_tenant_unknown_uuid_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx.tenants.get_tenant(TenantUuid::new()).await;

        assert!(
            matches!(result, Err(TenantsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn subscription_status_counts_distinct_active_artisans() -> TestResult {
        let ctx = TestContext::new().await;

        for artisan in ["A1", "A2", "A1"] {
            ctx.portal_tokens
                .issue_token(ctx.tenant_uuid, NewPortalToken::for_artisan(artisan))
                .await?;
        }

        let summary = ctx.tenants.subscription_status(ctx.tenant_uuid).await?;

        assert!(summary.active);
        assert_eq!(summary.status, SubscriptionStatus::Trial);
        assert_eq!(summary.plan, SubscriptionPlan::Basic);
        assert_eq!(summary.artisan_limit, 10);
        assert_eq!(summary.artisans_in_use, 2);
        assert_eq!(summary.features, ["tokens", "submissions", "photos"]);

        Ok(())
    }

    #[tokio::test]
    async fn subscription_status_is_isolated_per_tenant() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.create_tenant("Other").await;

        ctx.portal_tokens
            .issue_token(other, NewPortalToken::for_artisan("A1"))
            .await?;

        let summary = ctx.tenants.subscription_status(ctx.tenant_uuid).await?;

        assert_eq!(summary.artisans_in_use, 0);

        Ok(())
    }
}
