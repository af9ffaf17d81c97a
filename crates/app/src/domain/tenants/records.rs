//! Tenant Records

use jiff::Timestamp;

use crate::{
    domain::tenants::plans::{SubscriptionPlan, SubscriptionStatus},
    uuids::TypedUuid,
};

/// Tenant UUID
pub type TenantUuid = TypedUuid<TenantRecord>;

/// Tenant Record
#[derive(Debug, Clone)]
pub struct TenantRecord {
    /// Unique tenant identifier.
    pub uuid: TenantUuid,

    /// Human-readable tenant name.
    pub name: String,

    /// Billing contact address, when known.
    pub email: Option<String>,

    /// Billing state.
    pub subscription_status: SubscriptionStatus,

    /// Commercial plan.
    pub subscription_plan: SubscriptionPlan,

    /// Maximum number of distinct artisans holding an active portal token.
    pub allowed_artisans: u32,

    /// Soft-disable switch; inactive tenants never authenticate.
    pub is_active: bool,

    /// Billing customer id.
    pub stripe_customer_id: Option<String>,

    /// Billing subscription id.
    pub stripe_subscription_id: Option<String>,

    /// Tenant creation timestamp.
    pub created_at: Timestamp,

    /// Last update timestamp.
    pub updated_at: Timestamp,
}

/// Subscription state as reported to the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    /// Whether the tenant can use the API.
    pub active: bool,
    /// Billing state.
    pub status: SubscriptionStatus,
    /// Commercial plan.
    pub plan: SubscriptionPlan,
    /// Artisan quota.
    pub artisan_limit: u32,
    /// Artisans holding an active token.
    pub artisans_in_use: u32,
    /// Feature flags of the plan.
    pub features: Vec<String>,
}

impl SubscriptionSummary {
    /// Summary of `tenant` given its current quota usage.
    #[must_use]
    pub fn new(tenant: &TenantRecord, artisans_in_use: u32) -> Self {
        Self {
            active: tenant.is_active && tenant.subscription_status.is_entitled(),
            status: tenant.subscription_status,
            plan: tenant.subscription_plan,
            artisan_limit: tenant.allowed_artisans,
            artisans_in_use,
            features: tenant
                .subscription_plan
                .features()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
