//! Subscription plans, statuses and the billing price catalog.

use std::{fmt, str::FromStr};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Billing state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Trial period, entitled.
    Trial,
    /// Paying, entitled.
    Active,
    /// Cancelled by the tenant.
    Cancelled,
    /// Ended by the provider or by failed payments.
    Expired,
}

impl SubscriptionStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Whether the tenant may use the API in this state.
    #[must_use]
    pub const fn is_entitled(self) -> bool {
        matches!(self, Self::Trial | Self::Active)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "trial" => Ok(Self::Trial),
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Commercial plan of a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    /// Entry plan.
    #[default]
    Basic,
    /// Mid-tier plan.
    Pro,
    /// Top plan.
    Enterprise,
}

const BASIC_FEATURES: &[&str] = &["tokens", "submissions", "photos"];
const PRO_FEATURES: &[&str] = &["tokens", "submissions", "photos", "reports", "api_extended"];
const ENTERPRISE_FEATURES: &[&str] = &[
    "tokens",
    "submissions",
    "photos",
    "reports",
    "api_extended",
    "webhooks",
    "priority_support",
];

impl SubscriptionPlan {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Artisan quota granted by the plan.
    #[must_use]
    pub const fn artisan_limit(self) -> u32 {
        match self {
            Self::Basic => 10,
            Self::Pro => 50,
            Self::Enterprise => 999,
        }
    }

    /// Feature flags included in the plan.
    #[must_use]
    pub const fn features(self) -> &'static [&'static str] {
        match self {
            Self::Basic => BASIC_FEATURES,
            Self::Pro => PRO_FEATURES,
            Self::Enterprise => ENTERPRISE_FEATURES,
        }
    }

    /// Plan granted to a fresh tenant.
    #[must_use]
    pub const fn allowance(self) -> PlanAllowance {
        PlanAllowance {
            plan: self,
            allowed_artisans: self.artisan_limit(),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionPlan {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A status or plan name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

/// A plan together with the artisan quota that comes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanAllowance {
    /// The plan.
    pub plan: SubscriptionPlan,
    /// Artisan quota.
    pub allowed_artisans: u32,
}

/// Maps billing price identifiers to plans.
#[derive(Debug, Clone, Default)]
pub struct PriceCatalog {
    prices: FxHashMap<String, PlanAllowance>,
}

impl PriceCatalog {
    /// Catalog from an explicit price table.
    #[must_use]
    pub fn new(prices: FxHashMap<String, PlanAllowance>) -> Self {
        Self { prices }
    }

    /// Resolve a price to a known plan, if any.
    #[must_use]
    pub fn lookup(&self, price_id: &str) -> Option<PlanAllowance> {
        self.prices.get(price_id).copied()
    }

    /// Resolve a price, falling back to the basic plan for unknown prices.
    #[must_use]
    pub fn resolve(&self, price_id: Option<&str>) -> PlanAllowance {
        price_id
            .and_then(|price_id| self.lookup(price_id))
            .unwrap_or_else(|| SubscriptionPlan::Basic.allowance())
    }
}

/// Malformed price catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceCatalogParseError {
    /// The entry is not `price_id=plan[:artisans]`.
    #[error("price entry `{0}` must look like `price_id=plan` or `price_id=plan:artisans`")]
    Malformed(String),

    /// The plan name is not recognised.
    #[error("price entry `{entry}` names an unknown plan")]
    UnknownPlan {
        /// The offending entry.
        entry: String,
    },

    /// The artisan limit is not a number.
    #[error("price entry `{0}` has an invalid artisan limit")]
    InvalidLimit(String),
}

/// Parses `price_a=pro,price_b=enterprise:1500` style catalogs.
impl FromStr for PriceCatalog {
    type Err = PriceCatalogParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut prices = FxHashMap::default();

        for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (price_id, allowance) = entry
                .split_once('=')
                .ok_or_else(|| PriceCatalogParseError::Malformed(entry.to_string()))?;

            let (plan, limit) = match allowance.split_once(':') {
                Some((plan, limit)) => (plan, Some(limit)),
                None => (allowance, None),
            };

            let plan = plan
                .trim()
                .parse::<SubscriptionPlan>()
                .map_err(|_unknown| PriceCatalogParseError::UnknownPlan {
                    entry: entry.to_string(),
                })?;

            let allowed_artisans = match limit {
                Some(limit) => limit
                    .trim()
                    .parse::<u32>()
                    .map_err(|_invalid| PriceCatalogParseError::InvalidLimit(entry.to_string()))?,
                None => plan.artisan_limit(),
            };

            prices.insert(
                price_id.trim().to_string(),
                PlanAllowance {
                    plan,
                    allowed_artisans,
                },
            );
        }

        Ok(Self { prices })
    }
}
