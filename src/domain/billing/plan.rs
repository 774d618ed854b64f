//! Subscription plans and addon services.
//!
//! Plans and addons are administered outside the billing core; here they are
//! read-only inputs to pricing and activation. The only field the core ever
//! mutates is the plan's subscriber counter, and that mutation goes through
//! an atomic repository increment, never through this struct.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AddonId, Currency, Money, PlanId};

/// Billing cycle chosen by the subscriber at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Subscription period length for this cycle.
    pub fn period_days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Yearly => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<BillingCycle> {
        match s {
            "monthly" => Some(BillingCycle::Monthly),
            "yearly" => Some(BillingCycle::Yearly),
            _ => None,
        }
    }
}

/// A priced subscription tier with per-feature limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Price per native billing period, in minor units.
    pub price: Money,
    pub currency: Currency,
    /// The period the listed price covers.
    pub billing_period: BillingCycle,
    /// Maximum concurrent property listings; None means unlimited.
    pub listing_limit: Option<u32>,
    /// Maximum photos per listing; None means unlimited.
    pub photo_limit: Option<u32>,
    pub featured_listings: bool,
    pub subscriber_count: i64,
    pub is_active: bool,
}

/// An optional priced feature bundled into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonService {
    pub id: AddonId,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub is_active: bool,
}
