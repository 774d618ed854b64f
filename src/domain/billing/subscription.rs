//! Subscription aggregate.
//!
//! A user holds at most one subscription that is pending or active at a time.
//! Activation is driven by payment settlement; the activator decides period
//! length from the billing cycle of the settled payment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AddonId, Currency, Money, PaymentId, PlanId, SubscriptionId, Timestamp, UserId,
};

use super::payment::Payment;
use super::plan::BillingCycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<SubscriptionStatus> {
        match s {
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Whether this subscription blocks the user from buying another plan.
    pub fn blocks_new_purchase(&self) -> bool {
        matches!(self, SubscriptionStatus::Pending | SubscriptionStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    /// Payment that activated (or will activate) this subscription.
    pub payment_id: PaymentId,
    /// Addon services bought alongside the plan.
    pub addon_ids: Vec<AddonId>,
    /// Amount the activating payment charged.
    pub amount: Money,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub auto_renew: bool,
    pub starts_at: Timestamp,
    pub expires_at: Timestamp,
    /// When the activating payment settled.
    pub last_payment_at: Timestamp,
    /// Why the subscription was cancelled, when it was.
    pub cancellation_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Builds an active subscription from a settled payment, starting now
    /// and valid for the cycle's period length. Renewal is on by default.
    pub fn activate_now(payment: &Payment, currency: Currency) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id: payment.user_id,
            plan_id: payment.plan_id,
            payment_id: payment.id,
            addon_ids: payment.addon_ids.clone(),
            amount: payment.amount,
            currency,
            billing_cycle: payment.billing_cycle,
            status: SubscriptionStatus::Active,
            auto_renew: true,
            starts_at: now,
            expires_at: now.add_days(payment.billing_cycle.period_days()),
            last_payment_at: now,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, at: Timestamp) -> bool {
        self.expires_at.is_before(&at)
    }
}
