//! GetPaymentStatusHandler - read side of the payment lifecycle.

use std::sync::Arc;

use tracing::debug;

use crate::domain::billing::{BillingError, Payment};
use crate::domain::foundation::UserId;
use crate::ports::{GatewayPayment, PaymentGateway, PaymentRepository};

/// Query for one payment by its gateway order id.
#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub user_id: UserId,
    pub order_id: String,
}

/// A payment together with the gateway's current view of it, when one could
/// be fetched.
#[derive(Debug, Clone)]
pub struct PaymentStatusView {
    pub payment: Payment,
    pub gateway_status: Option<GatewayPayment>,
}

/// Handler for payment lookups, scoped to the requesting user.
pub struct GetPaymentStatusHandler {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl GetPaymentStatusHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { payments, gateway }
    }

    /// One payment by order id, with the gateway's status alongside when the
    /// payment has settled gateway-side. A payment belonging to another user
    /// is indistinguishable from a missing one.
    ///
    /// The gateway fetch is best effort: the local record is authoritative,
    /// so a gateway outage degrades to a local-only answer.
    pub async fn handle(
        &self,
        query: GetPaymentStatusQuery,
    ) -> Result<PaymentStatusView, BillingError> {
        let payment = self
            .payments
            .find_by_order_id(&query.order_id)
            .await?
            .filter(|p| p.user_id == query.user_id)
            .ok_or(BillingError::PaymentNotFound)?;

        let gateway_status = match &payment.gateway_payment_id {
            Some(id) => match self.gateway.fetch_payment(id).await {
                Ok(status) => Some(status),
                Err(e) => {
                    debug!(order_id = %payment.order_id, error = %e, "gateway status fetch failed");
                    None
                }
            },
            None => None,
        };

        Ok(PaymentStatusView {
            payment,
            gateway_status,
        })
    }

    /// The user's payment history, newest first.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Payment>, BillingError> {
        self.payments.find_by_user(user_id).await
    }
}
