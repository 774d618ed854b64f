//! RefundPaymentHandler - operator-driven refund of a settled payment.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::billing::{
    BillingError, PaymentStatus, RefundDetails, TransitionOutcome,
};
use crate::domain::foundation::{Money, PaymentId, Timestamp};
use crate::ports::{PaymentGateway, PaymentRepository, RefundRequest, SubscriptionRepository};

const DEFAULT_REFUND_REASON: &str = "Subscription cancellation";

/// Command to refund a paid payment. Admin-only at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub payment_id: PaymentId,
    /// Partial refund amount; full refund when absent.
    pub amount: Option<Money>,
    pub reason: Option<String>,
}

/// Result of a refund.
#[derive(Debug, Clone)]
pub struct RefundPaymentResult {
    pub payment_id: PaymentId,
    pub refund: RefundDetails,
    /// Whether the user's subscription was cancelled alongside the refund.
    pub subscription_cancelled: bool,
}

/// Handler for refunds.
///
/// The gateway refund happens before the local transition, so a crash
/// between the two leaves a gateway refund with a still-paid local row; the
/// guarded `paid -> refunded` transition makes re-running the command safe,
/// and the gateway dedupes refunds on its side.
pub struct RefundPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundPaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            payments,
            subscriptions,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
    ) -> Result<RefundPaymentResult, BillingError> {
        // 1. The payment must exist and be paid
        let payment = self
            .payments
            .find_by_id(cmd.payment_id)
            .await?
            .ok_or(BillingError::PaymentNotFound)?;

        if payment.status != PaymentStatus::Paid {
            return Err(BillingError::RefundNotAllowed {
                status: payment.status,
            });
        }

        // 2. A gateway refund needs the gateway's payment id; synthetic
        //    orders never captured real money
        let gateway_payment_id = payment.gateway_payment_id.clone().ok_or_else(|| {
            BillingError::validation(
                "payment_id",
                "Payment has no gateway payment id to refund against",
            )
        })?;

        let reason = cmd
            .reason
            .unwrap_or_else(|| DEFAULT_REFUND_REASON.to_string());

        // 3. Refund at the gateway first
        let refund_ref = self
            .gateway
            .refund(RefundRequest {
                payment_id: gateway_payment_id,
                amount: cmd.amount,
                reason: reason.clone(),
            })
            .await?;

        let refund = RefundDetails {
            refund_id: refund_ref.id,
            amount: refund_ref.amount,
            reason,
            refunded_at: Timestamp::now(),
        };

        // 4. Guarded local transition
        match self.payments.mark_refunded(payment.id, &refund).await? {
            TransitionOutcome::Applied => {}
            TransitionOutcome::NoOp => {
                warn!(payment_id = %payment.id, "payment settled concurrently during refund");
                return Err(BillingError::RefundNotAllowed {
                    status: payment.status,
                });
            }
            TransitionOutcome::NotFound => return Err(BillingError::PaymentNotFound),
        }

        // 5. Cancel the subscription the payment bought, if it still blocks
        let subscription_cancelled = match self
            .subscriptions
            .find_blocking_by_user(payment.user_id)
            .await?
        {
            Some(subscription) => {
                self.subscriptions
                    .cancel(subscription.id, &refund.reason)
                    .await?
                    == TransitionOutcome::Applied
            }
            None => false,
        };

        info!(
            payment_id = %payment.id,
            refund_id = %refund.refund_id,
            amount = %refund.amount,
            subscription_cancelled,
            "payment refunded"
        );

        Ok(RefundPaymentResult {
            payment_id: payment.id,
            refund,
            subscription_cancelled,
        })
    }
}
