//! Gateway webhook envelope and event parsing.
//!
//! The gateway posts a JSON envelope of the form
//! `{"event": "...", "payload": {...}}`. Payment events nest the payment
//! under `payload.payment.entity`; `order.paid` nests the order under
//! `payload.order.entity`. Unrecognized events are preserved so the handler
//! can acknowledge them without acting.

use serde::Deserialize;

use crate::domain::foundation::Money;

use super::payment::FailureDetails;

/// Payment entity carried by `payment.*` events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookPaymentEntity {
    pub id: String,
    pub order_id: String,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_reason: Option<String>,
}

impl WebhookPaymentEntity {
    /// Failure details as recorded on the payment row. The description falls
    /// back to the reason when the gateway omits it.
    pub fn failure_details(&self) -> FailureDetails {
        FailureDetails {
            description: self
                .error_description
                .clone()
                .or_else(|| self.error_reason.clone()),
            reason: self.error_reason.clone(),
        }
    }
}

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    PaymentCaptured(WebhookPaymentEntity),
    PaymentAuthorized(WebhookPaymentEntity),
    PaymentFailed(WebhookPaymentEntity),
    OrderPaid { order_id: String },
    Unknown(String),
}

impl WebhookEvent {
    pub fn name(&self) -> &str {
        match self {
            WebhookEvent::PaymentCaptured(_) => "payment.captured",
            WebhookEvent::PaymentAuthorized(_) => "payment.authorized",
            WebhookEvent::PaymentFailed(_) => "payment.failed",
            WebhookEvent::OrderPaid { .. } => "order.paid",
            WebhookEvent::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    payment: Option<Wrapped<WebhookPaymentEntity>>,
    #[serde(default)]
    order: Option<Wrapped<OrderEntity>>,
}

#[derive(Debug, Deserialize)]
struct Wrapped<T> {
    entity: T,
}

#[derive(Debug, Deserialize)]
struct OrderEntity {
    id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookParseError {
    #[error("Webhook body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Event '{event}' is missing its payload entity")]
    MissingEntity { event: String },
}

/// Parses a raw webhook body into an event.
pub fn parse_webhook(body: &[u8]) -> Result<WebhookEvent, WebhookParseError> {
    let Envelope { event, payload } = serde_json::from_slice(body)
        .map_err(|e| WebhookParseError::InvalidJson(e.to_string()))?;

    fn entity<T>(wrapped: Option<Wrapped<T>>, event: &str) -> Result<T, WebhookParseError> {
        wrapped
            .map(|w| w.entity)
            .ok_or_else(|| WebhookParseError::MissingEntity {
                event: event.to_string(),
            })
    }

    match event.as_str() {
        "payment.captured" => Ok(WebhookEvent::PaymentCaptured(entity(payload.payment, &event)?)),
        "payment.authorized" => {
            Ok(WebhookEvent::PaymentAuthorized(entity(payload.payment, &event)?))
        }
        "payment.failed" => Ok(WebhookEvent::PaymentFailed(entity(payload.payment, &event)?)),
        "order.paid" => {
            let order = entity(payload.order, &event)?;
            Ok(WebhookEvent::OrderPaid { order_id: order.id })
        }
        _ => Ok(WebhookEvent::Unknown(event.clone())),
    }
}
