//! Subscription persistence port.

use async_trait::async_trait;

use crate::domain::billing::{BillingError, Subscription, TransitionOutcome};
use crate::domain::foundation::{SubscriptionId, UserId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, BillingError>;

    /// The user's subscription that still blocks a new purchase (pending or
    /// active), if any.
    async fn find_blocking_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, BillingError>;

    /// Store the user's subscription, replacing any previous row for the
    /// same user. A user holds at most one subscription record.
    async fn upsert_for_user(&self, subscription: &Subscription) -> Result<(), BillingError>;

    /// Cancel a subscription, recording why. Applies only while it is
    /// pending or active.
    async fn cancel(
        &self,
        id: SubscriptionId,
        reason: &str,
    ) -> Result<TransitionOutcome, BillingError>;
}
