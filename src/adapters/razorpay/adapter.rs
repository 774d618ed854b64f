//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against the Razorpay REST API.
//! All requests authenticate with HTTP basic auth (key id / key secret) and
//! carry a bounded timeout so a stalled gateway cannot hold request handlers
//! hostage.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::PaymentConfig;
use crate::domain::foundation::{Currency, Money};
use crate::ports::{
    CreateOrderRequest, GatewayError, GatewayPayment, OrderRef, PaymentGateway, RefundRef,
    RefundRequest,
};

use super::types::{
    CreateOrderBody, ErrorEnvelope, RazorpayOrder, RazorpayPayment, RazorpayRefund, RefundBody,
    RefundNotes,
};

/// Razorpay gateway adapter.
pub struct RazorpayAdapter {
    key_id: String,
    key_secret: SecretString,
    base_url: String,
    request_timeout: Duration,
    http_client: reqwest::Client,
}

impl RazorpayAdapter {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            http_client: reqwest::Client::new(),
        }
    }

    fn network_error(e: reqwest::Error) -> GatewayError {
        GatewayError::Unavailable(e.to_string())
    }

    /// Map a non-2xx response to a gateway error, using Razorpay's error
    /// envelope when it parses.
    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => GatewayError::Rejected(envelope.message()),
            Err(_) => GatewayError::Rejected(format!("HTTP {}", status)),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayAdapter {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRef, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = CreateOrderBody {
            amount: request.amount.minor(),
            currency: request.currency.as_str(),
            receipt: &request.receipt,
        };

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let order: RazorpayOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let currency = Currency::parse(&order.currency).ok_or_else(|| {
            GatewayError::InvalidResponse(format!("unknown currency '{}'", order.currency))
        })?;

        Ok(OrderRef {
            id: order.id,
            amount: Money::from_minor(order.amount),
            currency,
            receipt: order.receipt.unwrap_or(request.receipt),
            synthetic: false,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let payment: RazorpayPayment = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(GatewayPayment {
            id: payment.id,
            order_id: payment.order_id,
            amount: Money::from_minor(payment.amount),
            status: payment.status,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundRef, GatewayError> {
        let url = format!(
            "{}/v1/payments/{}/refund",
            self.base_url, request.payment_id
        );
        let body = RefundBody {
            amount: request.amount.map(|a| a.minor()),
            notes: RefundNotes {
                reason: request.reason,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let refund: RazorpayRefund = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(RefundRef {
            id: refund.id,
            amount: Money::from_minor(refund.amount),
        })
    }
}
