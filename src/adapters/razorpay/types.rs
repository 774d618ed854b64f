//! Razorpay wire types.
//!
//! Amounts on the wire are integers in the currency's minor unit, matching
//! [`Money`](crate::domain::foundation::Money) exactly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct CreateOrderBody<'a> {
    pub amount: i64,
    pub currency: &'a str,
    pub receipt: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RazorpayPayment {
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RefundBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    pub notes: RefundNotes,
}

#[derive(Debug, Serialize)]
pub(super) struct RefundNotes {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RazorpayRefund {
    pub id: String,
    pub amount: i64,
}

/// Error envelope Razorpay returns on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorEnvelope {
    pub(super) fn message(&self) -> String {
        match (&self.error.code, &self.error.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (_, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown gateway error".to_string(),
        }
    }
}
