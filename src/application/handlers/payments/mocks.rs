//! In-memory port implementations shared by handler tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{
    AddonService, BillingError, FailureDetails, Payment, PaymentStatus, Plan, RefundDetails,
    Subscription, SubscriptionStatus, TransitionOutcome,
};
use crate::domain::foundation::{AddonId, Money, PaymentId, PlanId, SubscriptionId, Timestamp, UserId};
use crate::ports::{
    AddonRepository, CreateOrderRequest, GatewayError, GatewayPayment, OrderRef, PaymentGateway,
    PaymentRepository, PlanRepository, RefundRef, RefundRequest, SubscriptionRepository,
};

pub(crate) struct MockPlanRepository {
    plans: Mutex<Vec<Plan>>,
    pub(crate) increments: Mutex<Vec<PlanId>>,
}

impl MockPlanRepository {
    pub(crate) fn with_plan(plan: Plan) -> Self {
        Self {
            plans: Mutex::new(vec![plan]),
            increments: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscriber_count(&self, id: PlanId) -> i64 {
        self.plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.subscriber_count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn find_by_id(&self, id: PlanId) -> Result<Option<Plan>, BillingError> {
        Ok(self.plans.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn increment_subscriber_count(&self, id: PlanId) -> Result<(), BillingError> {
        self.increments.lock().unwrap().push(id);
        let mut plans = self.plans.lock().unwrap();
        if let Some(plan) = plans.iter_mut().find(|p| p.id == id) {
            plan.subscriber_count += 1;
        }
        Ok(())
    }
}

pub(crate) struct MockAddonRepository {
    addons: Mutex<Vec<AddonService>>,
}

impl MockAddonRepository {
    pub(crate) fn new() -> Self {
        Self {
            addons: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_addons(addons: Vec<AddonService>) -> Self {
        Self {
            addons: Mutex::new(addons),
        }
    }
}

#[async_trait]
impl AddonRepository for MockAddonRepository {
    async fn find_active_by_ids(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, BillingError> {
        let addons = self.addons.lock().unwrap();
        Ok(addons
            .iter()
            .filter(|a| a.is_active && ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

pub(crate) struct MockPaymentRepository {
    payments: Mutex<Vec<Payment>>,
}

impl MockPaymentRepository {
    pub(crate) fn new() -> Self {
        Self {
            payments: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_payment(payment: Payment) -> Self {
        Self {
            payments: Mutex::new(vec![payment]),
        }
    }

    pub(crate) fn get(&self, order_id: &str) -> Option<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned()
    }
}

#[async_trait]
impl PaymentRepository for MockPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), BillingError> {
        self.payments.lock().unwrap().push(payment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, BillingError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, BillingError> {
        Ok(self.get(order_id))
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, BillingError> {
        let mut payments: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn attach_gateway_payment_id(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.order_id == order_id) {
            None => Ok(TransitionOutcome::NotFound),
            Some(p) if p.status != PaymentStatus::Pending => Ok(TransitionOutcome::NoOp),
            Some(p) => {
                p.gateway_payment_id = Some(gateway_payment_id.to_string());
                p.updated_at = Timestamp::now();
                Ok(TransitionOutcome::Applied)
            }
        }
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.order_id == order_id) {
            None => Ok(TransitionOutcome::NotFound),
            Some(p) if p.status != PaymentStatus::Pending => Ok(TransitionOutcome::NoOp),
            Some(p) => {
                p.status = PaymentStatus::Paid;
                if let Some(id) = gateway_payment_id {
                    p.gateway_payment_id = Some(id.to_string());
                }
                p.updated_at = Timestamp::now();
                Ok(TransitionOutcome::Applied)
            }
        }
    }

    async fn mark_failed(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
        failure: &FailureDetails,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.order_id == order_id) {
            None => Ok(TransitionOutcome::NotFound),
            Some(p) if p.status != PaymentStatus::Pending => Ok(TransitionOutcome::NoOp),
            Some(p) => {
                p.status = PaymentStatus::Failed;
                p.failure = Some(failure.clone());
                if let Some(id) = gateway_payment_id {
                    p.gateway_payment_id = Some(id.to_string());
                }
                p.updated_at = Timestamp::now();
                Ok(TransitionOutcome::Applied)
            }
        }
    }

    async fn mark_refunded(
        &self,
        id: PaymentId,
        refund: &RefundDetails,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.id == id) {
            None => Ok(TransitionOutcome::NotFound),
            Some(p) if p.status != PaymentStatus::Paid => Ok(TransitionOutcome::NoOp),
            Some(p) => {
                p.status = PaymentStatus::Refunded;
                p.refund = Some(refund.clone());
                p.updated_at = Timestamp::now();
                Ok(TransitionOutcome::Applied)
            }
        }
    }
}

pub(crate) struct MockSubscriptionRepository {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl MockSubscriptionRepository {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_subscription(subscription: Subscription) -> Self {
        Self {
            subscriptions: Mutex::new(vec![subscription]),
        }
    }

    pub(crate) fn for_user(&self, user_id: UserId) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, BillingError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_blocking_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, BillingError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id && s.status.blocks_new_purchase())
            .cloned())
    }

    async fn upsert_for_user(&self, subscription: &Subscription) -> Result<(), BillingError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        subscriptions.retain(|s| s.user_id != subscription.user_id);
        subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn cancel(
        &self,
        id: SubscriptionId,
        reason: &str,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.iter_mut().find(|s| s.id == id) {
            None => Ok(TransitionOutcome::NotFound),
            Some(s) if !s.status.blocks_new_purchase() => Ok(TransitionOutcome::NoOp),
            Some(s) => {
                s.status = SubscriptionStatus::Cancelled;
                s.auto_renew = false;
                s.cancellation_reason = Some(reason.to_string());
                s.updated_at = Timestamp::now();
                Ok(TransitionOutcome::Applied)
            }
        }
    }
}

pub(crate) struct MockGateway {
    pub(crate) fail_create: bool,
    pub(crate) refunds: Mutex<Vec<RefundRequest>>,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self {
            fail_create: false,
            refunds: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_create: true,
            refunds: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRef, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::Unavailable("connection refused".to_string()));
        }
        Ok(OrderRef {
            id: format!("order_{}", &request.receipt),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
            synthetic: false,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        Ok(GatewayPayment {
            id: payment_id.to_string(),
            order_id: "order_test".to_string(),
            amount: Money::from_minor(0),
            status: "captured".to_string(),
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundRef, GatewayError> {
        let amount = request.amount.unwrap_or(Money::from_minor(249_900));
        self.refunds.lock().unwrap().push(request);
        Ok(RefundRef {
            id: "rfnd_mock123".to_string(),
            amount,
        })
    }
}
