//! Request and response DTOs for the payments API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingCycle, Payment, Subscription};
use crate::domain::foundation::{Money, Timestamp};
use crate::ports::OrderRef;

/// Request body for placing a subscription order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub plan_id: String,
    #[serde(default)]
    pub addon_ids: Vec<String>,
    pub billing_cycle: String,
    /// Total the storefront displayed, in minor units. Charged verbatim
    /// when within tolerance of the server-computed figure.
    #[serde(default)]
    pub client_total: Option<i64>,
}

/// Response for a placed order, with everything checkout needs to open.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: Money,
    pub currency: String,
    pub key_id: String,
    pub payment_id: String,
    /// True when the gateway was unreachable and a synthetic order was
    /// minted; checkout should treat it as auto-confirmed.
    pub synthetic: bool,
}

/// Request body for the checkout-callback confirmation.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Response for a checkout-callback confirmation.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionResponse>,
}

/// Request body for an admin-initiated refund.
#[derive(Debug, Deserialize)]
pub struct RefundPaymentRequest {
    /// Partial refund amount in minor units; full refund when absent.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response for a processed refund.
#[derive(Debug, Serialize)]
pub struct RefundPaymentResponse {
    pub payment_id: String,
    pub refund_id: String,
    pub amount: Money,
    pub reason: String,
    pub subscription_cancelled: bool,
}

/// A payment as exposed by status and history endpoints.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    pub plan_id: String,
    pub addon_ids: Vec<String>,
    pub amount: Money,
    pub billing_cycle: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Provider-side status, present when the status endpoint could reach
    /// the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            order_id: payment.order_id.clone(),
            gateway_payment_id: payment.gateway_payment_id.clone(),
            plan_id: payment.plan_id.to_string(),
            addon_ids: payment.addon_ids.iter().map(|a| a.to_string()).collect(),
            amount: payment.amount,
            billing_cycle: payment.billing_cycle.as_str(),
            status: payment.status.as_str(),
            failure_reason: payment
                .failure
                .as_ref()
                .and_then(|f| f.description.clone().or_else(|| f.reason.clone())),
            gateway_status: None,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

/// A subscription as exposed after activation.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub plan_id: String,
    pub addon_ids: Vec<String>,
    pub amount: Money,
    pub currency: &'static str,
    pub billing_cycle: &'static str,
    pub status: &'static str,
    pub auto_renew: bool,
    pub starts_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            plan_id: subscription.plan_id.to_string(),
            addon_ids: subscription
                .addon_ids
                .iter()
                .map(|a| a.to_string())
                .collect(),
            amount: subscription.amount,
            currency: subscription.currency.as_str(),
            billing_cycle: subscription.billing_cycle.as_str(),
            status: subscription.status.as_str(),
            auto_renew: subscription.auto_renew,
            starts_at: subscription.starts_at,
            expires_at: subscription.expires_at,
        }
    }
}

/// Standard error response shape.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Builds the checkout response from an order and its pending payment.
pub fn checkout_response(order: &OrderRef, payment: &Payment, key_id: &str) -> CreateOrderResponse {
    CreateOrderResponse {
        order_id: order.id.clone(),
        amount: order.amount,
        currency: order.currency.as_str().to_string(),
        key_id: key_id.to_string(),
        payment_id: payment.id.to_string(),
        synthetic: order.synthetic,
    }
}

/// Parses the billing cycle from a request, surfacing a field-level error.
pub fn parse_billing_cycle(value: &str) -> Result<BillingCycle, String> {
    BillingCycle::parse(value)
        .ok_or_else(|| format!("'{}' is not a valid billing cycle", value))
}
