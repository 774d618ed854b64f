//! Mock-order fallback for development environments.
//!
//! When the real gateway is unreachable (no credentials on a laptop, sandbox
//! outage), checkout flows can still be exercised end to end: the fallback
//! mints a local `order_mock_*` order instead of failing the request. Orders
//! minted here are flagged `synthetic`, skip checkout signature verification,
//! and never reach the real gateway. Configuration refuses to enable the
//! fallback in production.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::billing::SYNTHETIC_ORDER_PREFIX;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    CreateOrderRequest, GatewayError, GatewayPayment, OrderRef, PaymentGateway, RefundRef,
    RefundRequest,
};

/// Wraps a real gateway and substitutes a synthetic order when order
/// creation fails with a retryable error.
pub struct FallbackGateway {
    inner: Arc<dyn PaymentGateway>,
}

impl FallbackGateway {
    pub fn new(inner: Arc<dyn PaymentGateway>) -> Self {
        Self { inner }
    }

    fn synthetic_order(request: &CreateOrderRequest) -> OrderRef {
        OrderRef {
            id: format!(
                "{}{}",
                SYNTHETIC_ORDER_PREFIX,
                Timestamp::now().as_unix_millis()
            ),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt.clone(),
            synthetic: true,
        }
    }
}

#[async_trait]
impl PaymentGateway for FallbackGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRef, GatewayError> {
        match self.inner.create_order(request.clone()).await {
            Ok(order) => Ok(order),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "gateway unreachable, minting synthetic order");
                Ok(Self::synthetic_order(&request))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.inner.fetch_payment(payment_id).await
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundRef, GatewayError> {
        self.inner.refund(request).await
    }
}
