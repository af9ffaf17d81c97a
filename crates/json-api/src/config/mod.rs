//! Server configuration module

use clap::Parser;

use portal_app::context::{AppConfig, BillingConfig};

use crate::config::{
    billing::BillingSettingsConfig,
    crm::CrmSettingsConfig,
    db::DatabaseConfig,
    mail::MailConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    portal::PortalConfig,
    server::ServerRuntimeConfig,
    storage::StorageConfig,
};

pub(crate) mod billing;
pub(crate) mod crm;
pub(crate) mod db;
pub(crate) mod mail;
pub(crate) mod observability;
pub(crate) mod portal;
pub(crate) mod server;
pub(crate) mod storage;

pub(crate) use observability::LogFormat;

/// Artisan portal JSON API server configuration
#[derive(Debug, Parser)]
#[command(name = "portal-json", about = "Artisan portal JSON API server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Public portal settings.
    #[command(flatten)]
    pub portal: PortalConfig,

    /// CRM connection settings.
    #[command(flatten)]
    pub crm: CrmSettingsConfig,

    /// Object storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Billing provider settings.
    #[command(flatten)]
    pub billing: BillingSettingsConfig,

    /// Outgoing mail settings.
    #[command(flatten)]
    pub mail: MailConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings the application services are built from.
    #[must_use]
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            database_url: self.database.database_url.clone(),
            public_url: self.portal.public_url.clone(),
            crm: self.crm.crm_config(),
            storage: self.storage.object_store_config(),
            billing: BillingConfig {
                webhook_secret: self.billing.webhook_secret.clone(),
                api: self.billing.api_config(),
                catalog: self.billing.price_plans.clone().unwrap_or_default(),
            },
            smtp: self.mail.smtp_config(),
        }
    }
}
