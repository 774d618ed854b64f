//! VerifyPaymentHandler - Command handler for the checkout-callback channel.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::billing::{
    is_synthetic_order, BillingError, PaymentSignatureVerifier, PaymentStatus, Subscription,
    TransitionOutcome,
};
use crate::domain::foundation::UserId;
use crate::ports::PaymentRepository;

use super::activate_subscription::SubscriptionActivator;

/// Command carrying the storefront's post-checkout confirmation.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub user_id: UserId,
    pub order_id: String,
    /// Gateway payment id reported by the checkout widget.
    pub gateway_payment_id: String,
    /// HMAC signature over `order_id|payment_id`, lowercase hex.
    pub signature: String,
}

/// Result of processing a checkout confirmation.
#[derive(Debug, Clone)]
pub enum VerifyPaymentResult {
    /// This confirmation settled the payment and activated the subscription.
    Activated { subscription: Subscription },
    /// The payment was already settled; nothing changed.
    AlreadyProcessed { status: PaymentStatus },
}

/// Handler for the checkout-callback confirmation channel.
///
/// The webhook channel may beat this one, or this one may arrive twice; the
/// guarded `pending -> paid` transition decides which confirmation wins, and
/// the loser reports `AlreadyProcessed` instead of failing.
pub struct VerifyPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    verifier: Arc<PaymentSignatureVerifier>,
    activator: Arc<SubscriptionActivator>,
}

impl VerifyPaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        verifier: Arc<PaymentSignatureVerifier>,
        activator: Arc<SubscriptionActivator>,
    ) -> Self {
        Self {
            payments,
            verifier,
            activator,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, BillingError> {
        // 1. The payment must exist and belong to the caller
        let payment = self
            .payments
            .find_by_order_id(&cmd.order_id)
            .await?
            .filter(|p| p.user_id == cmd.user_id)
            .ok_or(BillingError::PaymentNotFound)?;

        // 2. Verify the signature, except for locally minted orders which
        //    never had one
        if !is_synthetic_order(&cmd.order_id) {
            self.verifier
                .verify_checkout(&cmd.order_id, &cmd.gateway_payment_id, &cmd.signature)
                .map_err(|e| {
                    warn!(order_id = %cmd.order_id, "checkout signature rejected");
                    BillingError::InvalidSignature(e)
                })?;
        }

        // 3. Guarded settlement; only the first confirmation proceeds
        let outcome = self
            .payments
            .mark_paid(&cmd.order_id, Some(&cmd.gateway_payment_id))
            .await?;

        match outcome {
            TransitionOutcome::Applied => {
                let subscription = self.activator.activate_for(&payment).await?;
                info!(
                    order_id = %cmd.order_id,
                    gateway_payment_id = %cmd.gateway_payment_id,
                    "payment settled via checkout callback"
                );
                Ok(VerifyPaymentResult::Activated { subscription })
            }
            TransitionOutcome::NoOp => {
                info!(
                    order_id = %cmd.order_id,
                    status = payment.status.as_str(),
                    "duplicate checkout confirmation ignored"
                );
                Ok(VerifyPaymentResult::AlreadyProcessed {
                    status: payment.status,
                })
            }
            TransitionOutcome::NotFound => Err(BillingError::PaymentNotFound),
        }
    }
}
