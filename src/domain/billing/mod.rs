//! Billing domain: plans, pricing, payments, subscriptions, and the
//! signature scheme that protects their confirmations.

mod errors;
mod payment;
mod plan;
mod pricing;
mod signature;
mod subscription;
mod webhook;

pub use errors::BillingError;
pub use payment::{FailureDetails, Payment, PaymentStatus, RefundDetails, TransitionOutcome};
pub use plan::{AddonService, BillingCycle, Plan};
pub use pricing::{
    plan_amount, price_order, reconcile_client_total, PricedOrder, DEFAULT_AMOUNT_TOLERANCE,
};
pub use signature::{
    is_synthetic_order, PaymentSignatureVerifier, SignatureError, SYNTHETIC_ORDER_PREFIX,
};
pub use subscription::{Subscription, SubscriptionStatus};
pub use webhook::{
    parse_webhook, WebhookEvent, WebhookParseError, WebhookPaymentEntity,
};
