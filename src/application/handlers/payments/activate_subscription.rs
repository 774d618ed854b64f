//! SubscriptionActivator - turns a settled payment into an active subscription.

use std::sync::Arc;

use tracing::info;

use crate::domain::billing::{BillingError, Payment, Subscription};
use crate::ports::{PlanRepository, SubscriptionRepository};

/// Activates the subscription a payment paid for.
///
/// Must be invoked exactly once per payment: callers only reach it after a
/// guarded `pending -> paid` transition reported `Applied`, so a duplicate
/// confirmation on either channel never activates twice. Activation replaces
/// whatever subscription row the user held and bumps the plan's subscriber
/// counter atomically in storage.
pub struct SubscriptionActivator {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionActivator {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            plans,
            subscriptions,
        }
    }

    pub async fn activate_for(&self, payment: &Payment) -> Result<Subscription, BillingError> {
        let plan = self
            .plans
            .find_by_id(payment.plan_id)
            .await?
            .ok_or(BillingError::PlanNotFound)?;

        let subscription = Subscription::activate_now(payment, plan.currency);

        self.subscriptions.upsert_for_user(&subscription).await?;
        self.plans
            .increment_subscriber_count(payment.plan_id)
            .await?;

        info!(
            subscription_id = %subscription.id,
            user_id = %payment.user_id,
            plan_id = %payment.plan_id,
            billing_cycle = payment.billing_cycle.as_str(),
            expires_at = %subscription.expires_at,
            "subscription activated"
        );

        Ok(subscription)
    }
}
