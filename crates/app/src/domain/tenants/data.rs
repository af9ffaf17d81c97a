//! Tenant Data

use crate::domain::tenants::{
    plans::{PlanAllowance, SubscriptionPlan, SubscriptionStatus},
    records::TenantUuid,
};

/// New Tenant Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    /// UUID to assign to the tenant row.
    pub uuid: TenantUuid,

    /// Tenant name to persist.
    pub name: String,

    /// Billing contact.
    pub email: Option<String>,

    /// Initial subscription status.
    pub subscription_status: SubscriptionStatus,

    /// Initial plan.
    pub subscription_plan: SubscriptionPlan,

    /// Artisan quota.
    pub allowed_artisans: u32,

    /// Whether the tenant may authenticate.
    pub is_active: bool,

    /// Billing customer id.
    pub stripe_customer_id: Option<String>,

    /// Billing subscription id.
    pub stripe_subscription_id: Option<String>,
}

impl NewTenant {
    /// A tenant on a trial of the basic plan, without billing references.
    #[must_use]
    pub fn trial(uuid: TenantUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            email: None,
            subscription_status: SubscriptionStatus::Trial,
            subscription_plan: SubscriptionPlan::Basic,
            allowed_artisans: SubscriptionPlan::Basic.artisan_limit(),
            is_active: true,
            stripe_customer_id: None,
            stripe_subscription_id: None,
        }
    }
}

/// Subscription transition driven by a billing event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptionUpdate {
    /// New status.
    pub status: SubscriptionStatus,

    /// New plan and quota; `None` keeps the current ones.
    pub allowance: Option<PlanAllowance>,
}
