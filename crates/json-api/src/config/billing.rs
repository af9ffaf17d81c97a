//! Billing Config

use clap::Args;

use portal_app::domain::{
    billing::provider::{BillingApiConfig, DEFAULT_BILLING_API_URL},
    tenants::plans::PriceCatalog,
};

/// Billing provider settings.
#[derive(Debug, Args)]
pub struct BillingSettingsConfig {
    /// Webhook signing secret; webhooks are refused while unset
    #[arg(long = "stripe-webhook-secret", env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// Billing API key, used to read subscription prices on checkout
    #[arg(long = "stripe-secret-key", env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Billing API origin
    #[arg(long = "stripe-api-url", env = "STRIPE_API_URL", default_value = DEFAULT_BILLING_API_URL)]
    pub api_url: String,

    /// Price to plan table, e.g. `price_a=pro,price_b=enterprise:1500`
    #[arg(long = "stripe-price-plans", env = "STRIPE_PRICE_PLANS")]
    pub price_plans: Option<PriceCatalog>,
}

impl BillingSettingsConfig {
    /// API access, when a secret key is configured.
    #[must_use]
    pub fn api_config(&self) -> Option<BillingApiConfig> {
        self.secret_key.as_ref().map(|secret_key| BillingApiConfig {
            url: self.api_url.clone(),
            secret_key: secret_key.clone(),
        })
    }
}
