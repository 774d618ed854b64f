//! Payment gateway port for order and refund processing.
//!
//! Defines the contract for payment gateway integrations (e.g., Razorpay).
//! Implementations create gateway orders that the storefront checkout opens,
//! fetch payment state for manual reconciliation, and issue refunds.
//!
//! # Design
//!
//! - **Gateway agnostic**: Interface works with any order-based provider
//! - **Minor units**: All amounts are in the currency's minor unit
//! - **Idempotent callers**: Duplicate confirmations are resolved by the
//!   reconciler, not the gateway

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::foundation::{Currency, Money};

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order the storefront checkout can open.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRef, GatewayError>;

    /// Fetch a payment's current state from the gateway.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    /// Issue a refund for a captured payment.
    ///
    /// Refunds the full amount when `amount` is `None`.
    async fn refund(&self, request: RefundRequest) -> Result<RefundRef, GatewayError>;
}

/// Request to create a gateway order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Amount to collect, in minor units.
    pub amount: Money,

    pub currency: Currency,

    /// Merchant-side receipt reference.
    pub receipt: String,
}

/// A gateway order as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    /// Provider's order id.
    pub id: String,

    pub amount: Money,

    pub currency: Currency,

    pub receipt: String,

    /// Whether the order was minted locally instead of by the provider.
    pub synthetic: bool,
}

/// A payment as known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
    /// Provider's payment id.
    pub id: String,

    /// Order the payment belongs to.
    pub order_id: String,

    pub amount: Money,

    /// Provider-side status string (e.g. "captured", "failed").
    pub status: String,
}

/// Request to refund a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Provider's payment id to refund.
    pub payment_id: String,

    /// Partial refund amount; full refund when absent.
    pub amount: Option<Money>,

    /// Operator-supplied note recorded with the refund.
    pub reason: String,
}

/// A refund as acknowledged by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRef {
    /// Provider's refund id.
    pub id: String,

    /// Amount actually refunded, in minor units.
    pub amount: Money,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The gateway could not be reached or timed out.
    #[error("Gateway unreachable: {0}")]
    Unavailable(String),

    /// The gateway answered with a business-level rejection.
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),

    /// The gateway answered with something we could not interpret.
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether retrying the operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(msg) => BillingError::GatewayUnavailable(msg),
            GatewayError::Rejected(msg) => BillingError::GatewayRejected(msg),
            GatewayError::InvalidResponse(msg) => BillingError::GatewayRejected(msg),
        }
    }
}
