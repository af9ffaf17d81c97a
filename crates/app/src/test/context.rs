//! Test context for service-level integration tests.

use std::sync::Arc;

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::json;
use sqlx::{Connection, PgConnection, PgPool, query, query_scalar};

use crate::{
    database::{self, Db},
    dispatch::Dispatcher,
    domain::{
        api_keys::{PgApiKeysService, credentials::SecretHasher},
        billing::{PgBillingService, service::BillingSettings},
        documents::PgDocumentsService,
        photos::{PgPhotosService, records::PhotoUuid},
        portal_tokens::{
            PgPortalTokensService,
            data::PortalLinks,
            metadata::PortalMetadata,
            records::{PortalSession, PortalTokenUuid},
            token::RawPortalToken,
        },
        reports::PgReportsService,
        submissions::{
            PgSubmissionsService,
            data::NewSubmission,
            records::{SubmissionKind, SubmissionRecord, SubmissionUuid},
            repository::PgSubmissionsRepository,
        },
        tenants::{
            PgTenantsService, TenantsService,
            data::{NewTenant, SubscriptionUpdate},
            records::{TenantRecord, TenantUuid},
            repository::PgTenantsRepository,
        },
    },
};

use super::{
    db::TestDb,
    doubles::{MemoryObjectStore, RecordingCrm, RecordingMailer},
};

/// Name of the non-superuser app role used for RLS testing.
const APP_ROLE: &str = "portal_app_test";
const APP_ROLE_PASSWORD: &str = "portal_app_test_pass";

pub(crate) const PUBLIC_URL: &str = "https://portal.test";
pub(crate) const WEBHOOK_SECRET: &str = "whsec_test";

/// Services wired against a fresh database, with in-memory collaborators.
///
/// Services connect through a non-superuser role so row-level security is
/// enforced. `admin` is the superuser database, used only for setup and for
/// inspecting rows behind the services' backs.
pub(crate) struct TestContext {
    pub admin: TestDb,
    pub db: Db,
    pub hasher: SecretHasher,
    pub tenant_uuid: TenantUuid,

    pub tenants: PgTenantsService,
    pub api_keys: PgApiKeysService,
    pub portal_tokens: PgPortalTokensService,
    pub submissions: PgSubmissionsService,
    pub photos: PgPhotosService,
    pub documents: PgDocumentsService,
    pub reports: PgReportsService,
    pub billing: PgBillingService,

    pub store: MemoryObjectStore,
    pub crm: RecordingCrm,
    pub mailer: RecordingMailer,
}

impl TestContext {
    pub async fn new() -> Self {
        let admin = TestDb::new().await;

        let app_pool = Self::setup_app_pool(&admin).await;
        let db = Db::new(app_pool);

        // Cheap parameters; production uses the recommended ones.
        let hasher = SecretHasher::with_params(1024, 1, 1).expect("Failed to build test hasher");

        let store = MemoryObjectStore::default();
        let crm = RecordingCrm::default();
        let mailer = RecordingMailer::default();

        let tenant_uuid = TenantUuid::new();

        PgTenantsService::new(Db::new(admin.pool().clone()))
            .create_tenant(NewTenant::trial(tenant_uuid, "Test Tenant"))
            .await
            .expect("Failed to create default test tenant");

        let billing_settings = BillingSettings {
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            catalog: "price_pro=pro,price_enterprise=enterprise"
                .parse()
                .expect("Failed to parse test price catalog"),
        };

        Self {
            tenants: PgTenantsService::new(db.clone()),
            api_keys: PgApiKeysService::new(db.clone(), hasher.clone(), Dispatcher::Inline),
            portal_tokens: PgPortalTokensService::new(
                db.clone(),
                PortalLinks::new(PUBLIC_URL),
                Dispatcher::Inline,
            ),
            submissions: PgSubmissionsService::new(db.clone()),
            photos: PgPhotosService::new(db.clone(), Arc::new(store.clone())),
            documents: PgDocumentsService::new(db.clone(), Arc::new(store.clone())),
            reports: PgReportsService::new(
                db.clone(),
                Arc::new(store.clone()),
                Arc::new(crm.clone()),
                Dispatcher::Inline,
            ),
            billing: PgBillingService::new(
                db.clone(),
                hasher.clone(),
                billing_settings,
                None,
                Arc::new(mailer.clone()),
                Dispatcher::Inline,
            ),
            admin,
            db,
            hasher,
            tenant_uuid,
            store,
            crm,
            mailer,
        }
    }

    /// Create an additional tenant, useful for RLS isolation tests.
    pub async fn create_tenant(&self, name: &str) -> TenantUuid {
        self.insert_tenant(NewTenant::trial(TenantUuid::new(), name))
            .await
    }

    /// Create a tenant whose artisan quota is `allowed_artisans`.
    pub async fn create_tenant_with_quota(&self, name: &str, allowed_artisans: u32) -> TenantUuid {
        self.insert_tenant(NewTenant {
            allowed_artisans,
            ..NewTenant::trial(TenantUuid::new(), name)
        })
        .await
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> TenantUuid {
        PgTenantsService::new(Db::new(self.admin.pool().clone()))
            .create_tenant(tenant)
            .await
            .expect("Failed to create test tenant")
            .uuid
    }

    /// Apply a subscription transition directly, without a billing event.
    pub async fn set_subscription(&self, tenant: TenantUuid, update: SubscriptionUpdate) {
        let mut tx = self.admin.begin_test_transaction().await;

        PgTenantsRepository::new()
            .update_subscription(&mut tx, tenant, update)
            .await
            .expect("Failed to update subscription");

        tx.commit().await.expect("Failed to commit subscription");
    }

    /// Audit actions recorded for a tenant, oldest first.
    pub async fn audit_actions(&self, tenant: TenantUuid) -> Vec<String> {
        query_scalar(
            "SELECT action FROM audit_logs WHERE tenant_uuid = $1 ORDER BY created_at, uuid",
        )
        .bind(tenant.into_uuid())
        .fetch_all(self.admin.pool())
        .await
        .expect("Failed to read audit log")
    }

    /// A portal session for `artisan`, backed by a real token row.
    ///
    /// The row is inserted directly so that no issue audit entry is written.
    pub async fn portal_session(&self, tenant: TenantUuid, artisan: &str) -> PortalSession {
        let token = RawPortalToken::generate();
        let uuid = PortalTokenUuid::new();

        query(
            "UPDATE portal_tokens SET is_active = FALSE \
             WHERE tenant_uuid = $1 AND crm_artisan_id = $2 AND is_active",
        )
        .bind(tenant.into_uuid())
        .bind(artisan)
        .execute(self.admin.pool())
        .await
        .expect("Failed to deactivate previous tokens");

        query(
            "INSERT INTO portal_tokens \
               (uuid, tenant_uuid, crm_artisan_id, token_hash, token_prefix, metadata) \
             VALUES ($1, $2, $3, $4, $5, '{}'::jsonb)",
        )
        .bind(uuid.into_uuid())
        .bind(tenant.into_uuid())
        .bind(artisan)
        .bind(token.hash())
        .bind(token.prefix())
        .execute(self.admin.pool())
        .await
        .expect("Failed to insert portal token");

        PortalSession {
            token_uuid: uuid,
            tenant_uuid: tenant,
            artisan_id: artisan.to_string(),
            intervention_id: None,
            metadata: PortalMetadata::new(),
        }
    }

    /// Append a ledger entry for `session` without going through an upload.
    pub async fn seed_submission(
        &self,
        session: &PortalSession,
        kind: SubmissionKind,
    ) -> SubmissionRecord {
        let mut tx = self.admin.begin_test_transaction().await;

        database::set_tenant_context(&mut tx, session.tenant_uuid)
            .await
            .expect("Failed to set tenant context");

        let record = PgSubmissionsRepository::new()
            .append(
                &mut tx,
                NewSubmission {
                    session,
                    kind,
                    intervention_id: Some("INT-SEED"),
                    data: json!({ "seeded": kind.as_str() }),
                    storage_paths: Vec::new(),
                },
            )
            .await
            .expect("Failed to seed submission");

        tx.commit().await.expect("Failed to commit submission");

        record
    }

    pub async fn backdate_submission(&self, submission: SubmissionUuid, created_at: Timestamp) {
        query("UPDATE portal_submissions SET created_at = $2 WHERE uuid = $1")
            .bind(submission.into_uuid())
            .bind(SqlxTimestamp::from(created_at))
            .execute(self.admin.pool())
            .await
            .expect("Failed to backdate submission");
    }

    pub async fn stored_token_hash(&self, token: PortalTokenUuid) -> String {
        query_scalar("SELECT token_hash FROM portal_tokens WHERE uuid = $1")
            .bind(token.into_uuid())
            .fetch_one(self.admin.pool())
            .await
            .expect("Failed to read token hash")
    }

    pub async fn active_token_count(&self, tenant: TenantUuid, artisan: &str) -> i64 {
        query_scalar(
            "SELECT count(*) FROM portal_tokens \
             WHERE tenant_uuid = $1 AND crm_artisan_id = $2 AND is_active",
        )
        .bind(tenant.into_uuid())
        .bind(artisan)
        .fetch_one(self.admin.pool())
        .await
        .expect("Failed to count active tokens")
    }

    pub async fn token_last_accessed(&self, token: PortalTokenUuid) -> Option<Timestamp> {
        query_scalar::<_, Option<SqlxTimestamp>>(
            "SELECT last_accessed_at FROM portal_tokens WHERE uuid = $1",
        )
        .bind(token.into_uuid())
        .fetch_one(self.admin.pool())
        .await
        .expect("Failed to read last access")
        .map(SqlxTimestamp::to_jiff)
    }

    /// Move a token's expiry into the past.
    pub async fn expire_token(&self, token: PortalTokenUuid) {
        query("UPDATE portal_tokens SET expires_at = now() - interval '1 day' WHERE uuid = $1")
            .bind(token.into_uuid())
            .execute(self.admin.pool())
            .await
            .expect("Failed to expire token");
    }

    /// Flag a photo as pulled by the CRM.
    pub async fn mark_photo_synced(&self, tenant: TenantUuid, photo: PhotoUuid) {
        query(
            "UPDATE intervention_photos SET synced_to_crm = TRUE, synced_at = now() \
             WHERE uuid = $1 AND tenant_uuid = $2",
        )
        .bind(photo.into_uuid())
        .bind(tenant.into_uuid())
        .execute(self.admin.pool())
        .await
        .expect("Failed to mark photo synced");
    }

    /// Report rows of any status for one intervention.
    pub async fn report_count(&self, tenant: TenantUuid, artisan: &str, intervention: &str) -> i64 {
        query_scalar(
            "SELECT count(*) FROM intervention_reports \
             WHERE tenant_uuid = $1 AND crm_artisan_id = $2 AND crm_intervention_id = $3",
        )
        .bind(tenant.into_uuid())
        .bind(artisan)
        .bind(intervention)
        .fetch_one(self.admin.pool())
        .await
        .expect("Failed to count reports")
    }

    /// The newest tenant provisioned for a billing customer.
    pub async fn tenant_for_customer(&self, customer: &str) -> TenantRecord {
        let uuid: uuid::Uuid = query_scalar(
            "SELECT uuid FROM tenants WHERE stripe_customer_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(customer)
        .fetch_one(self.admin.pool())
        .await
        .expect("No tenant for customer");

        self.tenants
            .get_tenant(TenantUuid::from_uuid(uuid))
            .await
            .expect("Failed to load tenant")
    }

    /// Create a non-superuser role (once per server) and return a pool connected as it.
    ///
    /// PostgreSQL superusers bypass RLS even with `FORCE ROW LEVEL SECURITY`, so service
    /// tests must connect via this restricted role.
    async fn setup_app_pool(admin: &TestDb) -> PgPool {
        let su_url = &admin.superuser_url;

        // CREATE ROLE is server-scoped, so it runs against the maintenance database.
        let server_url = su_url.rsplit_once('/').map_or(su_url.as_str(), |x| x.0);
        let server_url = format!("{server_url}/postgres");

        let mut server_conn = PgConnection::connect(&server_url)
            .await
            .expect("Failed to connect to postgres database for role setup");

        // Parallel tests race here; an existing role (42710 or 23505) is fine.
        let created = query(&format!(
            "CREATE ROLE {APP_ROLE} WITH LOGIN PASSWORD '{APP_ROLE_PASSWORD}' \
               NOSUPERUSER NOCREATEDB NOCREATEROLE NOBYPASSRLS"
        ))
        .execute(&mut server_conn)
        .await;

        match created {
            Ok(_) => {}
            Err(sqlx::Error::Database(error))
                if matches!(error.code().as_deref(), Some("42710" | "23505")) => {}
            Err(error) => panic!("Failed to create app role: {error}"),
        }

        query(&format!(
            "GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}",
            admin.name
        ))
        .execute(&mut server_conn)
        .await
        .expect("Failed to grant CONNECT on test database");

        server_conn
            .close()
            .await
            .expect("Failed to close server connection");

        let mut db_conn = PgConnection::connect(su_url)
            .await
            .expect("Failed to connect to test database for privilege setup");

        for stmt in [
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {APP_ROLE}"
            ),
        ] {
            query(&stmt)
                .execute(&mut db_conn)
                .await
                .expect("Failed to grant table privileges to app role");
        }

        db_conn
            .close()
            .await
            .expect("Failed to close db connection");

        let app_url = su_url.replacen(
            "portal_test:portal_test_password",
            &format!("{APP_ROLE}:{APP_ROLE_PASSWORD}"),
            1,
        );

        let pool = PgPool::connect(&app_url)
            .await
            .expect("Failed to create app pool");

        database::ensure_rls_enforced_role(&pool)
            .await
            .expect("App role must not bypass RLS");

        pool
    }
}
