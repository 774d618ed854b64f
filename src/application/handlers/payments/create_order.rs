//! CreateOrderHandler - Command handler for placing a subscription order.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::billing::{price_order, reconcile_client_total, BillingError, Payment};
use crate::domain::billing::BillingCycle;
use crate::domain::foundation::{AddonId, Money, PlanId, Timestamp, UserId};
use crate::ports::{
    AddonRepository, CreateOrderRequest, OrderRef, PaymentGateway, PaymentRepository,
    PlanRepository, SubscriptionRepository,
};

/// Command to place an order for a plan plus optional addons.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub billing_cycle: BillingCycle,
    /// Total the storefront displayed, for cross-checking only.
    pub client_total: Option<Money>,
}

/// A placed order: the gateway order to open in checkout and the pending
/// payment row tracking it.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: OrderRef,
    pub payment: Payment,
}

/// Handler for placing subscription orders.
///
/// Prices the order server-side, refuses a second purchase while the user
/// still holds a pending or active subscription, creates the gateway order,
/// and records a pending payment keyed by the gateway order id.
pub struct CreateOrderHandler {
    plans: Arc<dyn PlanRepository>,
    addons: Arc<dyn AddonRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    amount_tolerance: i64,
}

impl CreateOrderHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        addons: Arc<dyn AddonRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        amount_tolerance: i64,
    ) -> Self {
        Self {
            plans,
            addons,
            subscriptions,
            payments,
            gateway,
            amount_tolerance,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, BillingError> {
        // 1. One blocking subscription per user
        if let Some(existing) = self
            .subscriptions
            .find_blocking_by_user(cmd.user_id)
            .await?
        {
            warn!(
                user_id = %cmd.user_id,
                subscription_id = %existing.id,
                "order refused: user already holds a blocking subscription"
            );
            return Err(BillingError::ActiveSubscriptionExists);
        }

        // 2. Load the catalog entries
        let plan = self
            .plans
            .find_by_id(cmd.plan_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(BillingError::PlanNotFound)?;

        let addons = self.addons.find_active_by_ids(&cmd.addon_ids).await?;
        if addons.len() != cmd.addon_ids.len() {
            return Err(BillingError::AddonNotFound);
        }

        // 3. Price server-side; a client total within tolerance is charged
        //    verbatim, anything further off is replaced by the server figure
        let priced = price_order(&plan, &addons, cmd.billing_cycle)?;
        let total = reconcile_client_total(priced.total, cmd.client_total, self.amount_tolerance);

        // 4. Create the gateway order
        let receipt = format!("sub_{}_{}", cmd.plan_id, Timestamp::now().as_unix_millis());
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount: total,
                currency: plan.currency,
                receipt,
            })
            .await?;

        // 5. Record the pending payment keyed by the order id
        let payment = Payment::new_pending(
            cmd.user_id,
            cmd.plan_id,
            cmd.addon_ids,
            order.id.clone(),
            total,
            cmd.billing_cycle,
        );
        self.payments.insert(&payment).await?;

        info!(
            user_id = %cmd.user_id,
            plan_id = %cmd.plan_id,
            order_id = %order.id,
            amount = %total,
            synthetic = order.synthetic,
            "order created"
        );

        Ok(CreateOrderResult { order, payment })
    }
}
