//! App Context

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    crm::{CrmClient, CrmConfig, HttpCrmClient},
    database::{self, Db},
    dispatch::Dispatcher,
    domain::{
        api_keys::{
            ApiKeysService, PgApiKeysService,
            credentials::{CredentialError, SecretHasher},
        },
        billing::{
            BillingService, PgBillingService,
            provider::{BillingApiConfig, HttpBillingApi, SubscriptionLookup},
            service::BillingSettings,
        },
        documents::{DocumentsService, PgDocumentsService},
        photos::{PgPhotosService, PhotosService},
        portal_tokens::{PgPortalTokensService, PortalTokensService, data::PortalLinks},
        reports::{PgReportsService, ReportsService},
        submissions::{PgSubmissionsService, SubmissionsService},
        tenants::{PgTenantsService, TenantsService, plans::PriceCatalog},
    },
    mailer::{LogMailer, Mailer, SmtpConfig, SmtpMailer},
    storage::{HttpObjectStore, ObjectStore, ObjectStoreConfig},
};

/// Errors raised while wiring the application.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The database could not be reached or its role is unsafe.
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    /// The Argon2 parameters were rejected.
    #[error("failed to initialise secret hashing")]
    Hasher(#[source] CredentialError),
}

/// Billing integration settings.
#[derive(Debug, Clone, Default)]
pub struct BillingConfig {
    /// Signing secret of the webhook endpoint; webhooks are refused without it.
    pub webhook_secret: Option<String>,

    /// Billing API access, used to read a subscription's price on checkout.
    pub api: Option<BillingApiConfig>,

    /// Price id to plan mapping applied to new subscriptions.
    pub catalog: PriceCatalog,
}

/// Everything needed to wire the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string for the runtime role.
    pub database_url: String,

    /// Public origin of the artisan portal.
    pub public_url: String,

    /// CRM connection.
    pub crm: CrmConfig,
    /// Upload storage.
    pub storage: ObjectStoreConfig,
    /// Billing integration.
    pub billing: BillingConfig,

    /// SMTP relay; welcome emails are only logged without it.
    pub smtp: Option<SmtpConfig>,
}

/// Shared handles to every service, cloned into request handlers.
#[derive(Clone)]
pub struct AppContext {
    /// Tenant lookups and subscription status.
    pub tenants: Arc<dyn TenantsService>,
    /// Tenant API key authentication and management.
    pub api_keys: Arc<dyn ApiKeysService>,
    /// Portal token issuance and artisan authentication.
    pub portal_tokens: Arc<dyn PortalTokensService>,
    /// Submission ledger.
    pub submissions: Arc<dyn SubmissionsService>,
    /// Intervention photos.
    pub photos: Arc<dyn PhotosService>,
    /// Artisan compliance documents.
    pub documents: Arc<dyn DocumentsService>,
    /// Intervention reports.
    pub reports: Arc<dyn ReportsService>,
    /// Billing webhooks.
    pub billing: Arc<dyn BillingService>,
    /// CRM proxy.
    pub crm: Arc<dyn CrmClient>,
    /// Portal URL builder.
    pub links: PortalLinks,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Connect to the database and build every service.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, when the connected
    /// role bypasses row-level security, or when the secret hasher cannot be set up.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        database::ensure_rls_enforced_role(&pool)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);
        let hasher = SecretHasher::recommended().map_err(AppInitError::Hasher)?;
        let dispatcher = Dispatcher::Detached;
        let links = PortalLinks::new(&config.public_url);

        let store: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(config.storage));
        let crm: Arc<dyn CrmClient> = Arc::new(HttpCrmClient::new(config.crm));

        let mailer: Arc<dyn Mailer> = match config.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, "welcome emails go through SMTP");
                Arc::new(SmtpMailer::new(smtp))
            }
            None => {
                warn!("SMTP_HOST not set; welcome emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let subscriptions = config.billing.api.map(|api| {
            let lookup: Arc<dyn SubscriptionLookup> = Arc::new(HttpBillingApi::new(api));
            lookup
        });

        if config.billing.webhook_secret.is_none() {
            warn!("STRIPE_WEBHOOK_SECRET not set; billing webhooks will be refused");
        }

        let billing = PgBillingService::new(
            db.clone(),
            hasher.clone(),
            BillingSettings {
                webhook_secret: config.billing.webhook_secret,
                catalog: config.billing.catalog,
            },
            subscriptions,
            mailer,
            dispatcher,
        );

        Ok(Self {
            tenants: Arc::new(PgTenantsService::new(db.clone())),
            api_keys: Arc::new(PgApiKeysService::new(db.clone(), hasher, dispatcher)),
            portal_tokens: Arc::new(PgPortalTokensService::new(
                db.clone(),
                links.clone(),
                dispatcher,
            )),
            submissions: Arc::new(PgSubmissionsService::new(db.clone())),
            photos: Arc::new(PgPhotosService::new(db.clone(), Arc::clone(&store))),
            documents: Arc::new(PgDocumentsService::new(db.clone(), Arc::clone(&store))),
            reports: Arc::new(PgReportsService::new(
                db,
                store,
                Arc::clone(&crm),
                dispatcher,
            )),
            billing: Arc::new(billing),
            crm,
            links,
        })
    }
}
