//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use portal_app::{
    context::AppContext,
    crm::MockCrmClient,
    domain::{
        api_keys::{
            MockApiKeysService,
            credentials::Scope,
            records::{ApiKeyRecord, ApiKeyUuid, AuthenticatedTenant},
        },
        billing::MockBillingService,
        documents::MockDocumentsService,
        photos::MockPhotosService,
        portal_tokens::{
            MockPortalTokensService,
            data::PortalLinks,
            metadata::{MetadataValue, PortalMetadata},
            records::{PortalSession, PortalTokenUuid},
        },
        reports::MockReportsService,
        submissions::MockSubmissionsService,
        tenants::{
            MockTenantsService,
            plans::{SubscriptionPlan, SubscriptionStatus},
            records::{TenantRecord, TenantUuid},
        },
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_TENANT_UUID: TenantUuid = TenantUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_PUBLIC_URL: &str = "https://portal.test";

pub(crate) fn tenant_record() -> TenantRecord {
    TenantRecord {
        uuid: TEST_TENANT_UUID,
        name: "Acme Plumbing".to_string(),
        email: Some("ops@acme.test".to_string()),
        subscription_status: SubscriptionStatus::Active,
        subscription_plan: SubscriptionPlan::Pro,
        allowed_artisans: SubscriptionPlan::Pro.artisan_limit(),
        is_active: true,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn authenticated_tenant() -> AuthenticatedTenant {
    AuthenticatedTenant {
        tenant: tenant_record(),
        api_key: ApiKeyRecord {
            uuid: ApiKeyUuid::from_uuid(Uuid::nil()),
            tenant_uuid: TEST_TENANT_UUID,
            key_id: "pk_live_abc".to_string(),
            key_secret_hash: "$argon2id$test".to_string(),
            label: "Production".to_string(),
            scopes: Scope::defaults()
                .iter()
                .map(|scope| scope.as_str().to_string())
                .collect(),
            created_at: Timestamp::UNIX_EPOCH,
            last_used_at: None,
            revoked_at: None,
        },
    }
}

pub(crate) fn portal_session() -> PortalSession {
    PortalSession {
        token_uuid: PortalTokenUuid::from_uuid(Uuid::nil()),
        tenant_uuid: TEST_TENANT_UUID,
        artisan_id: "ART-1".to_string(),
        intervention_id: Some("INT-1".to_string()),
        metadata: PortalMetadata::new()
            .with("name", MetadataValue::Text("Jean Dupont".to_string())),
    }
}

#[handler]
pub(crate) async fn inject_tenant(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_tenant(authenticated_tenant());
    ctrl.call_next(req, depot, res).await;
}

#[handler]
pub(crate) async fn inject_portal_session(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_portal_session(portal_session());
    ctrl.call_next(req, depot, res).await;
}

fn strict_tenants() -> MockTenantsService {
    let mut tenants = MockTenantsService::new();

    tenants.expect_create_tenant().never();
    tenants.expect_get_tenant().never();
    tenants.expect_subscription_status().never();

    tenants
}

fn strict_api_keys() -> MockApiKeysService {
    let mut api_keys = MockApiKeysService::new();

    api_keys.expect_authenticate().never();
    api_keys.expect_create_api_key().never();
    api_keys.expect_list_api_keys().never();
    api_keys.expect_revoke_api_key().never();

    api_keys
}

fn strict_portal_tokens() -> MockPortalTokensService {
    let mut tokens = MockPortalTokensService::new();

    tokens.expect_issue_token().never();
    tokens.expect_authenticate().never();

    tokens
}

fn strict_submissions() -> MockSubmissionsService {
    let mut submissions = MockSubmissionsService::new();

    submissions.expect_list_submissions().never();
    submissions.expect_mark_synced().never();

    submissions
}

fn strict_photos() -> MockPhotosService {
    let mut photos = MockPhotosService::new();

    photos.expect_list_photos().never();
    photos.expect_upload_photo().never();
    photos.expect_update_comment().never();
    photos.expect_delete_photo().never();

    photos
}

fn strict_documents() -> MockDocumentsService {
    let mut documents = MockDocumentsService::new();

    documents.expect_list_documents().never();
    documents.expect_upload_document().never();

    documents
}

fn strict_reports() -> MockReportsService {
    let mut reports = MockReportsService::new();

    reports.expect_latest_report().never();
    reports.expect_generate_report().never();
    reports.expect_submit_report().never();
    reports.expect_submitted_report().never();

    reports
}

fn strict_billing() -> MockBillingService {
    let mut billing = MockBillingService::new();

    billing.expect_receive_webhook().never();
    billing.expect_handle_event().never();

    billing
}

fn strict_crm() -> MockCrmClient {
    let mut crm = MockCrmClient::new();

    crm.expect_artisan_interventions().never();
    crm.expect_intervention_detail().never();
    crm.expect_intervention_documents().never();
    crm.expect_artisan_documents().never();
    crm.expect_upload_artisan_document().never();
    crm.expect_intervention_report().never();
    crm.expect_submit_intervention_report().never();
    crm.expect_notify_report_submitted().never();

    crm
}

/// An [`AppContext`] of strict mocks; swap in the ones a test exercises.
pub(crate) struct TestApp {
    app: AppContext,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        Self {
            app: AppContext {
                tenants: Arc::new(strict_tenants()),
                api_keys: Arc::new(strict_api_keys()),
                portal_tokens: Arc::new(strict_portal_tokens()),
                submissions: Arc::new(strict_submissions()),
                photos: Arc::new(strict_photos()),
                documents: Arc::new(strict_documents()),
                reports: Arc::new(strict_reports()),
                billing: Arc::new(strict_billing()),
                crm: Arc::new(strict_crm()),
                links: PortalLinks::new(TEST_PUBLIC_URL),
            },
        }
    }

    pub(crate) fn tenants(mut self, tenants: MockTenantsService) -> Self {
        self.app.tenants = Arc::new(tenants);
        self
    }

    pub(crate) fn api_keys(mut self, api_keys: MockApiKeysService) -> Self {
        self.app.api_keys = Arc::new(api_keys);
        self
    }

    pub(crate) fn portal_tokens(mut self, tokens: MockPortalTokensService) -> Self {
        self.app.portal_tokens = Arc::new(tokens);
        self
    }

    pub(crate) fn submissions(mut self, submissions: MockSubmissionsService) -> Self {
        self.app.submissions = Arc::new(submissions);
        self
    }

    pub(crate) fn photos(mut self, photos: MockPhotosService) -> Self {
        self.app.photos = Arc::new(photos);
        self
    }

    pub(crate) fn documents(mut self, documents: MockDocumentsService) -> Self {
        self.app.documents = Arc::new(documents);
        self
    }

    pub(crate) fn reports(mut self, reports: MockReportsService) -> Self {
        self.app.reports = Arc::new(reports);
        self
    }

    pub(crate) fn billing(mut self, billing: MockBillingService) -> Self {
        self.app.billing = Arc::new(billing);
        self
    }

    pub(crate) fn crm(mut self, crm: MockCrmClient) -> Self {
        self.app.crm = Arc::new(crm);
        self
    }

    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(self.app)
    }

    /// Serve `route` without authentication.
    pub(crate) fn public_service(self, route: Router) -> Service {
        Service::new(Router::new().hoop(inject(self.into_state())).push(route))
    }

    /// Serve `route` as the fixture tenant.
    pub(crate) fn tenant_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_tenant)
                .push(route),
        )
    }

    /// Serve `route` as the fixture artisan.
    pub(crate) fn portal_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_portal_session)
                .push(route),
        )
    }
}

pub(crate) const MULTIPART_BOUNDARY: &str = "portal-test-boundary";

/// A `multipart/form-data` body with text `fields` and an optional `file` part
/// given as `(filename, mime type, contents)`.
pub(crate) fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str)>) -> String {
    let mut body = String::new();

    for (name, value) in fields {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }

    if let Some((filename, mime_type, contents)) = file {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime_type}\r\n\r\n{contents}\r\n"
        ));
    }

    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));

    body
}

pub(crate) fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}
