//! Billing webhook processing.
//!
//! A checkout provisions a tenant and its first API key. Subscription events
//! move the tenant between statuses and plans.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    database::{Db, set_tenant_context},
    dispatch::Dispatcher,
    domain::{
        api_keys::{credentials::SecretHasher, data::NewApiKey, service::ApiKeyProvisioner},
        audit::{AuditAction, NewAuditEntry, PgAuditRepository},
        billing::{
            errors::BillingError,
            events::{BillingEvent, CheckoutSession, Invoice, Subscription},
            provider::SubscriptionLookup,
            signature::verify_signature,
        },
        tenants::{
            data::{NewTenant, SubscriptionUpdate},
            plans::{PriceCatalog, SubscriptionStatus},
            records::TenantUuid,
            repository::PgTenantsRepository,
        },
    },
    mailer::{Mailer, WelcomeEmail},
};

/// Why a webhook delivery was not fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFailure {
    /// No webhook secret is configured.
    NotConfigured,
    /// The signature did not verify.
    InvalidSignature,
    /// The event was verified but could not be applied.
    ProcessingFailed,
}

impl WebhookFailure {
    /// Wire name, e.g. `"invalid_signature"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotConfigured => "webhook_not_configured",
            Self::InvalidSignature => "invalid_signature",
            Self::ProcessingFailed => "processing_failed",
        }
    }
}

/// Acknowledgement returned to the billing provider.
///
/// Every outcome is acknowledged so the provider does not retry. `received`
/// is true once the signature has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookReceipt {
    /// The signature verified.
    pub received: bool,
    /// Why the delivery was not fully processed.
    pub error: Option<WebhookFailure>,
}

impl WebhookReceipt {
    const fn rejected(failure: WebhookFailure) -> Self {
        Self {
            received: false,
            error: Some(failure),
        }
    }

    const fn processed(error: Option<WebhookFailure>) -> Self {
        Self {
            received: true,
            error,
        }
    }
}

/// Webhook secret and price table.
#[derive(Debug, Clone, Default)]
pub struct BillingSettings {
    /// Endpoint signing secret. Deliveries are refused while unset.
    pub webhook_secret: Option<String>,

    /// Price id to plan mapping.
    pub catalog: PriceCatalog,
}

/// [`BillingService`] backed by Postgres.
#[derive(Clone)]
pub struct PgBillingService {
    db: Db,
    settings: BillingSettings,
    subscriptions: Option<Arc<dyn SubscriptionLookup>>,
    mailer: Arc<dyn Mailer>,
    dispatcher: Dispatcher,
    provisioner: ApiKeyProvisioner,
    tenants: PgTenantsRepository,
    audit: PgAuditRepository,
}

impl PgBillingService {
    /// Build the service. Without `subscriptions`, checkout prices come from metadata only.
    #[must_use]
    pub fn new(
        db: Db,
        hasher: SecretHasher,
        settings: BillingSettings,
        subscriptions: Option<Arc<dyn SubscriptionLookup>>,
        mailer: Arc<dyn Mailer>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            db,
            settings,
            subscriptions,
            mailer,
            dispatcher,
            provisioner: ApiKeyProvisioner::new(hasher),
            tenants: PgTenantsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    async fn complete_checkout(&self, session: CheckoutSession) -> Result<(), BillingError> {
        let (Some(customer), Some(subscription)) =
            (session.customer.as_deref(), session.subscription.as_deref())
        else {
            return Err(BillingError::IncompleteCheckout(session.id));
        };

        let price_id = match &self.subscriptions {
            Some(lookup) => lookup.first_price_id(subscription).await?,
            None => None,
        }
        .or_else(|| session.price_id().map(str::to_string));

        let allowance = self.settings.catalog.resolve(price_id.as_deref());

        let mut tx = self.db.begin_transaction().await?;

        if let Some(existing) = self
            .tenants
            .find_tenant_by_subscription(&mut tx, subscription)
            .await?
        {
            info!(tenant = %existing.uuid, subscription, "checkout already provisioned");

            tx.commit().await?;

            return Ok(());
        }

        let tenant = self
            .tenants
            .create_tenant(
                &mut tx,
                NewTenant {
                    uuid: TenantUuid::new(),
                    name: session.tenant_name().to_string(),
                    email: session.contact_email().map(str::to_string),
                    subscription_status: SubscriptionStatus::Active,
                    subscription_plan: allowance.plan,
                    allowed_artisans: allowance.allowed_artisans,
                    is_active: true,
                    stripe_customer_id: Some(customer.to_string()),
                    stripe_subscription_id: Some(subscription.to_string()),
                },
            )
            .await?;

        let issued = self
            .provisioner
            .provision(&mut tx, tenant.uuid, &NewApiKey::production())
            .await?;

        set_tenant_context(&mut tx, tenant.uuid).await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant.uuid, AuditAction::TenantCreatedViaStripe, "tenant")
                    .resource(tenant.uuid)
                    .details(json!({
                        "stripe_customer_id": customer,
                        "stripe_subscription_id": subscription,
                        "plan": allowance.plan.as_str(),
                        "allowed_artisans": allowance.allowed_artisans,
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(
            tenant = %tenant.uuid,
            key_id = %issued.record.key_id,
            plan = %allowance.plan,
            "tenant provisioned from checkout"
        );

        let Some(email) = session.contact_email() else {
            warn!(
                tenant = %tenant.uuid,
                key_id = %issued.record.key_id,
                "checkout has no contact email; API credentials require manual delivery"
            );

            return Ok(());
        };

        let mailer = Arc::clone(&self.mailer);
        let welcome = WelcomeEmail {
            to: email.to_string(),
            tenant_name: tenant.name,
            key_id: issued.record.key_id,
            secret: issued.secret,
            plan: allowance.plan,
            allowed_artisans: allowance.allowed_artisans,
        };

        self.dispatcher
            .dispatch("welcome_email", async move {
                mailer.send_welcome(&welcome).await
            })
            .await;

        Ok(())
    }

    async fn update_subscription(&self, subscription: Subscription) -> Result<(), BillingError> {
        let status = match (subscription.status.as_str(), subscription.cancel_at_period_end) {
            ("canceled", _) | (_, true) => SubscriptionStatus::Cancelled,
            ("past_due" | "unpaid", _) => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Active,
        };

        let allowance = subscription
            .price_id()
            .and_then(|price_id| self.settings.catalog.lookup(price_id));

        self.transition(
            &subscription.customer,
            SubscriptionUpdate { status, allowance },
            AuditAction::SubscriptionUpdated,
            json!({
                "new_status": status.as_str(),
                "subscription_id": subscription.id,
                "plan": allowance.map(|allowance| allowance.plan.as_str()),
            }),
        )
        .await
    }

    async fn delete_subscription(&self, subscription: Subscription) -> Result<(), BillingError> {
        self.transition(
            &subscription.customer,
            SubscriptionUpdate {
                status: SubscriptionStatus::Cancelled,
                allowance: None,
            },
            AuditAction::SubscriptionDeleted,
            json!({ "subscription_id": subscription.id }),
        )
        .await
    }

    /// Apply a subscription change to the customer's tenant and audit it.
    async fn transition(
        &self,
        customer: &str,
        update: SubscriptionUpdate,
        action: AuditAction,
        details: Value,
    ) -> Result<(), BillingError> {
        let mut tx = self.db.begin_transaction().await?;

        let tenant = self
            .tenants
            .find_tenant_by_customer(&mut tx, customer)
            .await?
            .ok_or_else(|| BillingError::UnknownCustomer(customer.to_string()))?;

        let updated = self
            .tenants
            .update_subscription(&mut tx, tenant.uuid, update)
            .await?;

        set_tenant_context(&mut tx, tenant.uuid).await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant.uuid, action, "tenant")
                    .resource(tenant.uuid)
                    .details(details),
            )
            .await?;

        tx.commit().await?;

        info!(
            tenant = %updated.uuid,
            status = %updated.subscription_status,
            plan = %updated.subscription_plan,
            "subscription updated"
        );

        Ok(())
    }

    async fn record_payment_failure(&self, invoice: Invoice) -> Result<(), BillingError> {
        let Some(customer) = invoice.customer.as_deref() else {
            warn!(invoice = %invoice.id, "payment failure without customer");

            return Ok(());
        };

        let mut tx = self.db.begin_transaction().await?;

        let Some(tenant) = self.tenants.find_tenant_by_customer(&mut tx, customer).await? else {
            warn!(invoice = %invoice.id, customer, "payment failure for unknown customer");

            tx.commit().await?;

            return Ok(());
        };

        set_tenant_context(&mut tx, tenant.uuid).await?;

        self.audit
            .record(
                &mut tx,
                NewAuditEntry::new(tenant.uuid, AuditAction::PaymentFailed, "tenant")
                    .resource(tenant.uuid)
                    .details(json!({
                        "invoice_id": invoice.id,
                        "amount_due": invoice.amount_due,
                        "attempt_count": invoice.attempt_count,
                    })),
            )
            .await?;

        tx.commit().await?;

        warn!(
            tenant = %tenant.uuid,
            name = %tenant.name,
            attempts = invoice.attempt_count,
            "payment failed"
        );

        Ok(())
    }
}

impl std::fmt::Debug for PgBillingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgBillingService")
            .field("db", &self.db)
            .field("webhook_configured", &self.settings.webhook_secret.is_some())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BillingService for PgBillingService {
    async fn receive_webhook<'a>(
        &self,
        signature: Option<&'a str>,
        payload: &[u8],
    ) -> WebhookReceipt {
        let Some(secret) = self.settings.webhook_secret.as_deref() else {
            error!("billing webhook received but no webhook secret is configured");

            return WebhookReceipt::rejected(WebhookFailure::NotConfigured);
        };

        if let Err(error) = verify_signature(signature, payload, secret, Timestamp::now()) {
            warn!("billing webhook signature rejected: {error}");

            return WebhookReceipt::rejected(WebhookFailure::InvalidSignature);
        }

        let event = match BillingEvent::parse(payload) {
            Ok(event) => event,
            Err(error) => {
                error!("billing webhook payload rejected: {error}");

                return WebhookReceipt::processed(Some(WebhookFailure::ProcessingFailed));
            }
        };

        let kind = event.kind().to_string();

        match self.handle_event(event).await {
            Ok(()) => WebhookReceipt::processed(None),
            Err(error) => {
                error!(event = %kind, "billing webhook processing failed: {error}");

                WebhookReceipt::processed(Some(WebhookFailure::ProcessingFailed))
            }
        }
    }

    async fn handle_event(&self, event: BillingEvent) -> Result<(), BillingError> {
        match event {
            BillingEvent::CheckoutCompleted(session) => self.complete_checkout(session).await,
            BillingEvent::SubscriptionUpdated(subscription) => {
                self.update_subscription(subscription).await
            }
            BillingEvent::SubscriptionDeleted(subscription) => {
                self.delete_subscription(subscription).await
            }
            BillingEvent::PaymentFailed(invoice) => self.record_payment_failure(invoice).await,
            BillingEvent::Ignored(kind) => {
                info!(event = %kind, "ignoring billing event");

                Ok(())
            }
        }
    }
}

/// Billing webhook operations.
#[automock]
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Verify and process a raw webhook delivery. Never fails; see [`WebhookReceipt`].
    async fn receive_webhook<'a>(
        &self,
        signature: Option<&'a str>,
        payload: &[u8],
    ) -> WebhookReceipt;

    /// Apply a verified event.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError`] when the payload does not decode, the customer is unknown, or persistence fails.
    async fn handle_event(&self, event: BillingEvent) -> Result<(), BillingError>;
}
