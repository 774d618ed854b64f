//! Payment persistence port.
//!
//! Settlement methods are guarded transitions: the store applies the status
//! change only when the row is still in the state the transition expects, and
//! reports what happened through [`TransitionOutcome`]. This is what makes
//! duplicate and out-of-order confirmations safe to replay.

use async_trait::async_trait;

use crate::domain::billing::{
    BillingError, FailureDetails, Payment, RefundDetails, TransitionOutcome,
};
use crate::domain::foundation::{PaymentId, UserId};

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist a freshly created pending payment.
    async fn insert(&self, payment: &Payment) -> Result<(), BillingError>;

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, BillingError>;

    /// Find the payment tied to a gateway order id.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, BillingError>;

    /// Payments belonging to a user, newest first.
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, BillingError>;

    /// Record the gateway's payment id on a still-pending payment without
    /// settling it. Used for `payment.authorized`, which precedes capture;
    /// the status stays `pending` so a later capture or failure still
    /// applies.
    async fn attach_gateway_payment_id(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<TransitionOutcome, BillingError>;

    /// Settle the payment for `order_id` as paid, recording the gateway
    /// payment id when the confirmation names one. Applies only while the
    /// payment is pending.
    async fn mark_paid(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> Result<TransitionOutcome, BillingError>;

    /// Settle the payment for `order_id` as failed with the given details.
    /// Applies only while the payment is pending.
    async fn mark_failed(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
        failure: &FailureDetails,
    ) -> Result<TransitionOutcome, BillingError>;

    /// Record a refund against a paid payment. Applies only while the
    /// payment is paid.
    async fn mark_refunded(
        &self,
        id: PaymentId,
        refund: &RefundDetails,
    ) -> Result<TransitionOutcome, BillingError>;
}
