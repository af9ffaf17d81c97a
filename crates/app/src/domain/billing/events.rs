//! Billing webhook payloads.
//!
//! Only the fields the portal acts on are modelled; everything else in the
//! provider's objects is ignored.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

/// Envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEnvelope {
    /// Event id.
    pub id: String,

    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Wrapped object.
    pub data: EnvelopeData,
}

/// The `data` member of an envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeData {
    /// Event object, decoded according to the event type.
    pub object: Value,
}

/// A completed checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    /// Checkout session id.
    pub id: String,
    /// Billing customer id.
    pub customer: Option<String>,
    /// Subscription created by the checkout.
    pub subscription: Option<String>,
    /// Email entered at checkout.
    pub customer_email: Option<String>,

    /// Key/value pairs set when the checkout was created.
    #[serde(default)]
    pub metadata: FxHashMap<String, String>,
}

impl CheckoutSession {
    fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// `metadata.tenant_name`, else the customer email, else a placeholder.
    #[must_use]
    pub fn tenant_name(&self) -> &str {
        self.metadata("tenant_name")
            .or(self.customer_email.as_deref())
            .unwrap_or("Unknown Tenant")
    }

    /// Where to send the credentials.
    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .or_else(|| self.metadata("email"))
    }

    /// `metadata.price_id`, when the checkout carried one.
    #[must_use]
    pub fn price_id(&self) -> Option<&str> {
        self.metadata("price_id")
    }
}

/// A subscription object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscription {
    /// Subscription id.
    pub id: String,
    /// Billing customer id.
    pub customer: String,

    /// Provider status, e.g. `active` or `past_due`.
    #[serde(default)]
    pub status: String,

    /// Whether the subscription ends with the current period.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// Subscribed items.
    #[serde(default)]
    pub items: SubscriptionItems,
}

impl Subscription {
    /// Price of the first subscription item.
    #[must_use]
    pub fn price_id(&self) -> Option<&str> {
        self.items
            .data
            .first()
            .map(|item| item.price.id.as_str())
    }
}

/// List wrapper around subscription items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    /// Items, in provider order.
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

/// One subscribed item.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    /// Item price.
    pub price: Price,
}

/// A price reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    /// Price id, matched against the catalog.
    pub id: String,
}

/// An invoice object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub id: String,
    /// Billing customer id.
    pub customer: Option<String>,

    /// Amount due, in the smallest currency unit.
    #[serde(default)]
    pub amount_due: i64,

    /// Payment attempts so far.
    #[serde(default)]
    pub attempt_count: i64,
}

/// A webhook delivery the portal knows how to handle.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    /// `checkout.session.completed`
    CheckoutCompleted(CheckoutSession),
    /// `customer.subscription.updated`
    SubscriptionUpdated(Subscription),
    /// `customer.subscription.deleted`
    SubscriptionDeleted(Subscription),
    /// `invoice.payment_failed`
    PaymentFailed(Invoice),
    /// Any other event type, acknowledged without action.
    Ignored(String),
}

impl BillingEvent {
    /// Provider event type.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::CheckoutCompleted(_) => "checkout.session.completed",
            Self::SubscriptionUpdated(_) => "customer.subscription.updated",
            Self::SubscriptionDeleted(_) => "customer.subscription.deleted",
            Self::PaymentFailed(_) => "invoice.payment_failed",
            Self::Ignored(kind) => kind,
        }
    }

    /// Decode the event object according to its type.
    ///
    /// # Errors
    ///
    /// Returns an error when the object of a handled type does not match its shape.
    pub fn from_envelope(envelope: BillingEnvelope) -> Result<Self, serde_json::Error> {
        let object = envelope.data.object;

        Ok(match envelope.event_type.as_str() {
            "checkout.session.completed" => {
                Self::CheckoutCompleted(serde_json::from_value(object)?)
            }
            "customer.subscription.updated" => {
                Self::SubscriptionUpdated(serde_json::from_value(object)?)
            }
            "customer.subscription.deleted" => {
                Self::SubscriptionDeleted(serde_json::from_value(object)?)
            }
            "invoice.payment_failed" => Self::PaymentFailed(serde_json::from_value(object)?),
            _ => Self::Ignored(envelope.event_type),
        })
    }

    /// Parse a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not a well-formed event.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        Self::from_envelope(serde_json::from_slice(payload)?)
    }
}
