//! ProcessWebhookHandler - Command handler for the gateway webhook channel.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::billing::{
    parse_webhook, BillingError, PaymentSignatureVerifier, TransitionOutcome, WebhookEvent,
    WebhookPaymentEntity,
};
use crate::ports::PaymentRepository;

use super::activate_subscription::SubscriptionActivator;

/// Command carrying a raw gateway webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw body bytes, exactly as received; the signature covers them.
    pub body: Vec<u8>,
    /// Value of the gateway's signature header.
    pub signature: String,
}

/// Result of webhook processing. Every variant is acknowledged with 200 so
/// the gateway stops redelivering; only signature and parse failures bounce.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// This delivery settled the payment and activated the subscription.
    SubscriptionActivated { order_id: String },
    /// This delivery settled the payment as failed.
    PaymentFailed { order_id: String },
    /// An authorization preceding capture; the gateway payment id was
    /// recorded but the payment stays pending.
    AuthorizationRecorded { order_id: String },
    /// The payment was already settled; duplicate delivery.
    AlreadyProcessed { order_id: String },
    /// No payment matches the order; acknowledged without action.
    UnknownOrder { order_id: String },
    /// Event type we don't act on.
    Ignored { event: String },
}

/// Handler for the gateway webhook confirmation channel.
///
/// `payment.captured` and `order.paid` settle the payment as paid;
/// `payment.failed` settles it as failed. `payment.authorized` only records
/// the gateway payment id on the still-pending row, since authorization
/// precedes capture and the money may yet fail to move. Deliveries arrive
/// unordered and repeated, so every write goes through the same guarded
/// transitions as the checkout callback.
pub struct ProcessWebhookHandler {
    payments: Arc<dyn PaymentRepository>,
    verifier: Arc<PaymentSignatureVerifier>,
    activator: Arc<SubscriptionActivator>,
}

impl ProcessWebhookHandler {
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
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, BillingError> {
        // 1. The signature covers the raw body bytes
        self.verifier
            .verify_webhook(&cmd.body, &cmd.signature)
            .map_err(|e| {
                warn!("webhook signature rejected");
                BillingError::InvalidSignature(e)
            })?;

        // 2. Parse the envelope
        let event = parse_webhook(&cmd.body)
            .map_err(|e| BillingError::validation("body", e.to_string()))?;

        // 3. Dispatch
        match event {
            WebhookEvent::PaymentCaptured(entity) => {
                self.settle_paid(&entity.order_id, Some(&entity.id)).await
            }
            WebhookEvent::PaymentAuthorized(entity) => self.record_authorization(&entity).await,
            WebhookEvent::OrderPaid { order_id } => self.settle_paid(&order_id, None).await,
            WebhookEvent::PaymentFailed(entity) => self.settle_failed(&entity).await,
            WebhookEvent::Unknown(event) => {
                info!(event = %event, "webhook event ignored");
                Ok(ProcessWebhookResult::Ignored { event })
            }
        }
    }

    async fn settle_paid(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> Result<ProcessWebhookResult, BillingError> {
        match self.payments.mark_paid(order_id, gateway_payment_id).await? {
            TransitionOutcome::Applied => {
                let payment = self
                    .payments
                    .find_by_order_id(order_id)
                    .await?
                    .ok_or(BillingError::PaymentNotFound)?;
                self.activator.activate_for(&payment).await?;
                info!(order_id = %order_id, "payment settled via webhook");
                Ok(ProcessWebhookResult::SubscriptionActivated {
                    order_id: order_id.to_string(),
                })
            }
            TransitionOutcome::NoOp => {
                info!(order_id = %order_id, "duplicate webhook delivery ignored");
                Ok(ProcessWebhookResult::AlreadyProcessed {
                    order_id: order_id.to_string(),
                })
            }
            TransitionOutcome::NotFound => {
                warn!(order_id = %order_id, "webhook names an unknown order");
                Ok(ProcessWebhookResult::UnknownOrder {
                    order_id: order_id.to_string(),
                })
            }
        }
    }

    async fn record_authorization(
        &self,
        entity: &WebhookPaymentEntity,
    ) -> Result<ProcessWebhookResult, BillingError> {
        match self
            .payments
            .attach_gateway_payment_id(&entity.order_id, &entity.id)
            .await?
        {
            TransitionOutcome::Applied => {
                info!(
                    order_id = %entity.order_id,
                    gateway_payment_id = %entity.id,
                    "authorization recorded; awaiting capture"
                );
                Ok(ProcessWebhookResult::AuthorizationRecorded {
                    order_id: entity.order_id.clone(),
                })
            }
            TransitionOutcome::NoOp => Ok(ProcessWebhookResult::AlreadyProcessed {
                order_id: entity.order_id.clone(),
            }),
            TransitionOutcome::NotFound => {
                warn!(order_id = %entity.order_id, "authorization names an unknown order");
                Ok(ProcessWebhookResult::UnknownOrder {
                    order_id: entity.order_id.clone(),
                })
            }
        }
    }

    async fn settle_failed(
        &self,
        entity: &WebhookPaymentEntity,
    ) -> Result<ProcessWebhookResult, BillingError> {
        let failure = entity.failure_details();
        match self
            .payments
            .mark_failed(&entity.order_id, Some(&entity.id), &failure)
            .await?
        {
            TransitionOutcome::Applied => {
                info!(
                    order_id = %entity.order_id,
                    reason = failure.reason.as_deref().unwrap_or("unknown"),
                    "payment marked failed via webhook"
                );
                Ok(ProcessWebhookResult::PaymentFailed {
                    order_id: entity.order_id.clone(),
                })
            }
            TransitionOutcome::NoOp => Ok(ProcessWebhookResult::AlreadyProcessed {
                order_id: entity.order_id.clone(),
            }),
            TransitionOutcome::NotFound => Ok(ProcessWebhookResult::UnknownOrder {
                order_id: entity.order_id.clone(),
            }),
        }
    }
}
