//! Payment command handlers.
//!
//! Each handler wires ports together for one operation. Both confirmation
//! channels (checkout callback and gateway webhook) converge on the same
//! guarded payment transition and the same activator, which is what keeps
//! settlement idempotent regardless of delivery order.

mod activate_subscription;
mod create_order;
mod payment_status;
mod process_webhook;
mod refund_payment;
mod verify_payment;

#[cfg(test)]
pub(crate) mod mocks;

pub use activate_subscription::SubscriptionActivator;
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use payment_status::{GetPaymentStatusHandler, GetPaymentStatusQuery, PaymentStatusView};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};
