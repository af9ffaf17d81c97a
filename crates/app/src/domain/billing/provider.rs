//! Billing provider REST client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use thiserror::Error;

use crate::domain::billing::events::Subscription;

/// Default billing API origin.
pub const DEFAULT_BILLING_API_URL: &str = "https://api.stripe.com";

/// Billing API access.
#[derive(Debug, Clone)]
pub struct BillingApiConfig {
    /// API origin.
    pub url: String,
    /// Secret API key.
    pub secret_key: String,
}

/// Billing API failures.
#[derive(Debug, Error)]
pub enum BillingApiError {
    /// The request could not be sent or the body not read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("billing API responded with {status}: {body}")]
    UnexpectedResponse {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// Reads subscriptions from the billing provider.
#[automock]
#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    /// Price of the subscription's first item.
    ///
    /// # Errors
    ///
    /// Returns [`BillingApiError`] when the API is unreachable or refuses the call.
    async fn first_price_id(&self, subscription_id: &str) -> Result<Option<String>, BillingApiError>;
}

/// [`SubscriptionLookup`] over the provider's REST API.
#[derive(Debug, Clone)]
pub struct HttpBillingApi {
    config: BillingApiConfig,
    http: Client,
}

impl HttpBillingApi {
    /// Client for the configured API origin.
    #[must_use]
    pub fn new(config: BillingApiConfig) -> Self {
        let url = config.url.trim_end_matches('/').to_string();

        Self {
            config: BillingApiConfig { url, ..config },
            http: Client::new(),
        }
    }
}

#[async_trait]
impl SubscriptionLookup for HttpBillingApi {
    async fn first_price_id(&self, subscription_id: &str) -> Result<Option<String>, BillingApiError> {
        let response = self
            .http
            .get(format!(
                "{}/v1/subscriptions/{subscription_id}",
                self.config.url
            ))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(BillingApiError::UnexpectedResponse { status, body });
        }

        let subscription: Subscription = response.json().await?;

        Ok(subscription.price_id().map(str::to_string))
    }
}
