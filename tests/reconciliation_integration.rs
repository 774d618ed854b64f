//! End-to-end reconciliation flows through the application handlers, using
//! in-memory stores and a scripted gateway.
//!
//! The interesting property is that the two confirmation channels (checkout
//! callback and gateway webhook) can arrive in any order, any number of
//! times, and the payment settles exactly once.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;

use propbazaar::application::handlers::payments::{
    CreateOrderCommand, CreateOrderHandler, ProcessWebhookCommand, ProcessWebhookHandler,
    ProcessWebhookResult, RefundPaymentCommand, RefundPaymentHandler, SubscriptionActivator,
    VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};
use propbazaar::domain::billing::{
    AddonService, BillingCycle, BillingError, FailureDetails, Payment, PaymentSignatureVerifier,
    PaymentStatus, Plan, RefundDetails, Subscription, SubscriptionStatus, TransitionOutcome,
};
use propbazaar::domain::foundation::{
    AddonId, Currency, Money, PaymentId, PlanId, SubscriptionId, UserId,
};
use propbazaar::ports::{
    AddonRepository, CreateOrderRequest, GatewayError, GatewayPayment, OrderRef, PaymentGateway,
    PaymentRepository, PlanRepository, RefundRef, RefundRequest, SubscriptionRepository,
};

const KEY_SECRET: &str = "test_key_secret";
const WEBHOOK_SECRET: &str = "test_webhook_secret";

// ════════════════════════════════════════════════════════════════════════════
// In-memory stores
// ════════════════════════════════════════════════════════════════════════════

struct InMemoryPlans {
    plans: Mutex<Vec<Plan>>,
    increments: Mutex<u32>,
}

impl InMemoryPlans {
    fn with_plan(plan: Plan) -> Self {
        Self {
            plans: Mutex::new(vec![plan]),
            increments: Mutex::new(0),
        }
    }

    fn increments(&self) -> u32 {
        *self.increments.lock().unwrap()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlans {
    async fn find_by_id(&self, id: PlanId) -> Result<Option<Plan>, BillingError> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn increment_subscriber_count(&self, id: PlanId) -> Result<(), BillingError> {
        let mut plans = self.plans.lock().unwrap();
        if let Some(plan) = plans.iter_mut().find(|p| p.id == id) {
            plan.subscriber_count += 1;
        }
        *self.increments.lock().unwrap() += 1;
        Ok(())
    }
}

struct InMemoryAddons;

#[async_trait]
impl AddonRepository for InMemoryAddons {
    async fn find_active_by_ids(&self, _ids: &[AddonId]) -> Result<Vec<AddonService>, BillingError> {
        Ok(Vec::new())
    }
}

struct InMemoryPayments {
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryPayments {
    fn new() -> Self {
        Self {
            payments: Mutex::new(Vec::new()),
        }
    }

    fn by_order(&self, order_id: &str) -> Option<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPayments {
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
        Ok(self.by_order(order_id))
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
            Some(p) if p.status == PaymentStatus::Pending => {
                p.gateway_payment_id = Some(gateway_payment_id.to_string());
                Ok(TransitionOutcome::Applied)
            }
            Some(_) => Ok(TransitionOutcome::NoOp),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.order_id == order_id) {
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = PaymentStatus::Paid;
                if let Some(id) = gateway_payment_id {
                    p.gateway_payment_id = Some(id.to_string());
                }
                Ok(TransitionOutcome::Applied)
            }
            Some(_) => Ok(TransitionOutcome::NoOp),
            None => Ok(TransitionOutcome::NotFound),
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
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = PaymentStatus::Failed;
                if let Some(id) = gateway_payment_id {
                    p.gateway_payment_id = Some(id.to_string());
                }
                p.failure = Some(failure.clone());
                Ok(TransitionOutcome::Applied)
            }
            Some(_) => Ok(TransitionOutcome::NoOp),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn mark_refunded(
        &self,
        id: PaymentId,
        refund: &RefundDetails,
    ) -> Result<TransitionOutcome, BillingError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.iter_mut().find(|p| p.id == id) {
            Some(p) if p.status == PaymentStatus::Paid => {
                p.status = PaymentStatus::Refunded;
                p.refund = Some(refund.clone());
                Ok(TransitionOutcome::Applied)
            }
            Some(_) => Ok(TransitionOutcome::NoOp),
            None => Ok(TransitionOutcome::NotFound),
        }
    }
}

struct InMemorySubscriptions {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptions {
    fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn for_user(&self, user_id: UserId) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptions {
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
            Some(s) if s.status.blocks_new_purchase() => {
                s.status = SubscriptionStatus::Cancelled;
                s.auto_renew = false;
                s.cancellation_reason = Some(reason.to_string());
                Ok(TransitionOutcome::Applied)
            }
            Some(_) => Ok(TransitionOutcome::NoOp),
            None => Ok(TransitionOutcome::NotFound),
        }
    }
}

struct ScriptedGateway {
    refunds: Mutex<Vec<RefundRequest>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        Self {
            refunds: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderRef, GatewayError> {
        Ok(OrderRef {
            id: format!("order_{}", request.receipt),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
            synthetic: false,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        Err(GatewayError::Rejected(format!(
            "unknown payment {}",
            payment_id
        )))
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundRef, GatewayError> {
        let amount = request.amount.unwrap_or(Money::from_minor(249_900));
        self.refunds.lock().unwrap().push(request);
        Ok(RefundRef {
            id: "rfnd_test123".to_string(),
            amount,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fixture
// ════════════════════════════════════════════════════════════════════════════

fn test_plan(cycle: BillingCycle) -> Plan {
    Plan {
        id: PlanId::new(),
        name: "Agent Pro".to_string(),
        price: Money::from_major(2499),
        currency: Currency::Inr,
        billing_period: cycle,
        listing_limit: Some(50),
        photo_limit: Some(20),
        featured_listings: true,
        subscriber_count: 0,
        is_active: true,
    }
}

struct Fixture {
    plan: Plan,
    user_id: UserId,
    plans: Arc<InMemoryPlans>,
    payments: Arc<InMemoryPayments>,
    subscriptions: Arc<InMemorySubscriptions>,
    gateway: Arc<ScriptedGateway>,
    create_order: CreateOrderHandler,
    verify: VerifyPaymentHandler,
    webhook: ProcessWebhookHandler,
    refund: RefundPaymentHandler,
}

impl Fixture {
    fn new() -> Self {
        let plan = test_plan(BillingCycle::Monthly);
        let plans = Arc::new(InMemoryPlans::with_plan(plan.clone()));
        let payments = Arc::new(InMemoryPayments::new());
        let subscriptions = Arc::new(InMemorySubscriptions::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let verifier = Arc::new(PaymentSignatureVerifier::new(
            SecretString::new(KEY_SECRET.to_string()),
            SecretString::new(WEBHOOK_SECRET.to_string()),
        ));
        let activator = Arc::new(SubscriptionActivator::new(
            plans.clone(),
            subscriptions.clone(),
        ));

        Self {
            plan,
            user_id: UserId::new(),
            plans: plans.clone(),
            payments: payments.clone(),
            subscriptions: subscriptions.clone(),
            gateway: gateway.clone(),
            create_order: CreateOrderHandler::new(
                plans.clone(),
                Arc::new(InMemoryAddons),
                subscriptions.clone(),
                payments.clone(),
                gateway.clone(),
                10,
            ),
            verify: VerifyPaymentHandler::new(
                payments.clone(),
                verifier.clone(),
                activator.clone(),
            ),
            webhook: ProcessWebhookHandler::new(payments.clone(), verifier, activator),
            refund: RefundPaymentHandler::new(payments, subscriptions, gateway),
        }
    }

    async fn place_order(&self) -> String {
        let result = self
            .create_order
            .handle(CreateOrderCommand {
                user_id: self.user_id,
                plan_id: self.plan.id,
                addon_ids: vec![],
                billing_cycle: BillingCycle::Monthly,
                client_total: None,
            })
            .await
            .unwrap();
        result.order.id
    }
}

fn hmac_hex(secret: &str, message: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn checkout_signature(order_id: &str, payment_id: &str) -> String {
    hmac_hex(KEY_SECRET, format!("{}|{}", order_id, payment_id).as_bytes())
}

fn payment_webhook(event: &str, order_id: &str, payment_id: &str) -> (Vec<u8>, String) {
    let body = serde_json::json!({
        "event": event,
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": 249_900
                }
            }
        }
    })
    .to_string()
    .into_bytes();
    let signature = hmac_hex(WEBHOOK_SECRET, &body);
    (body, signature)
}

fn captured_webhook(order_id: &str, payment_id: &str) -> (Vec<u8>, String) {
    payment_webhook("payment.captured", order_id, payment_id)
}

// ════════════════════════════════════════════════════════════════════════════
// Reconciliation flows
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn checkout_confirmation_then_webhook_settles_once() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    // Channel 1: checkout callback settles and activates
    let result = fx
        .verify
        .handle(VerifyPaymentCommand {
            user_id: fx.user_id,
            order_id: order_id.clone(),
            gateway_payment_id: "pay_live1".to_string(),
            signature: checkout_signature(&order_id, "pay_live1"),
        })
        .await
        .unwrap();
    assert!(matches!(result, VerifyPaymentResult::Activated { .. }));

    // Channel 2: the webhook for the same capture is a duplicate
    let (body, signature) = captured_webhook(&order_id, "pay_live1");
    let result = fx
        .webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();
    assert!(matches!(result, ProcessWebhookResult::AlreadyProcessed { .. }));

    // Exactly one activation, one counted subscriber
    assert_eq!(fx.plans.increments(), 1);
    let subscription = fx.subscriptions.for_user(fx.user_id).unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(
        fx.payments.by_order(&order_id).unwrap().status,
        PaymentStatus::Paid
    );
}

#[tokio::test]
async fn webhook_then_checkout_confirmation_settles_once() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    let (body, signature) = captured_webhook(&order_id, "pay_live1");
    let result = fx
        .webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();
    assert!(matches!(
        result,
        ProcessWebhookResult::SubscriptionActivated { .. }
    ));

    let result = fx
        .verify
        .handle(VerifyPaymentCommand {
            user_id: fx.user_id,
            order_id: order_id.clone(),
            gateway_payment_id: "pay_live1".to_string(),
            signature: checkout_signature(&order_id, "pay_live1"),
        })
        .await
        .unwrap();
    assert!(matches!(
        result,
        VerifyPaymentResult::AlreadyProcessed {
            status: PaymentStatus::Paid
        }
    ));

    assert_eq!(fx.plans.increments(), 1);
}

#[tokio::test]
async fn duplicate_webhook_deliveries_activate_once() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    for round in 0..3 {
        let (body, signature) = captured_webhook(&order_id, "pay_live1");
        let result = fx
            .webhook
            .handle(ProcessWebhookCommand { body, signature })
            .await
            .unwrap();
        if round == 0 {
            assert!(matches!(
                result,
                ProcessWebhookResult::SubscriptionActivated { .. }
            ));
        } else {
            assert!(matches!(result, ProcessWebhookResult::AlreadyProcessed { .. }));
        }
    }

    assert_eq!(fx.plans.increments(), 1);
}

#[tokio::test]
async fn authorization_precedes_capture_without_activating() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    // Authorization only pins the gateway payment id; no money moved yet
    let (body, signature) = payment_webhook("payment.authorized", &order_id, "pay_live1");
    let result = fx
        .webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();
    assert!(matches!(
        result,
        ProcessWebhookResult::AuthorizationRecorded { .. }
    ));

    let payment = fx.payments.by_order(&order_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.gateway_payment_id.as_deref(), Some("pay_live1"));
    assert!(fx.subscriptions.for_user(fx.user_id).is_none());
    assert_eq!(fx.plans.increments(), 0);

    // The capture that follows is what settles and activates
    let (body, signature) = captured_webhook(&order_id, "pay_live1");
    let result = fx
        .webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();
    assert!(matches!(
        result,
        ProcessWebhookResult::SubscriptionActivated { .. }
    ));
    assert_eq!(fx.plans.increments(), 1);
}

#[tokio::test]
async fn failure_after_authorization_never_activates() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    let (body, signature) = payment_webhook("payment.authorized", &order_id, "pay_live1");
    fx.webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();

    let (body, signature) = payment_webhook("payment.failed", &order_id, "pay_live1");
    let result = fx
        .webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();
    assert!(matches!(result, ProcessWebhookResult::PaymentFailed { .. }));

    assert_eq!(
        fx.payments.by_order(&order_id).unwrap().status,
        PaymentStatus::Failed
    );
    assert!(fx.subscriptions.for_user(fx.user_id).is_none());
    assert_eq!(fx.plans.increments(), 0);
}

#[tokio::test]
async fn tampered_webhook_leaves_payment_pending() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    let (body, _) = captured_webhook(&order_id, "pay_live1");
    let err = fx
        .webhook
        .handle(ProcessWebhookCommand {
            body,
            signature: hmac_hex("wrong_secret", b"whatever"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidSignature(_)));

    assert_eq!(
        fx.payments.by_order(&order_id).unwrap().status,
        PaymentStatus::Pending
    );
    assert!(fx.subscriptions.for_user(fx.user_id).is_none());
}

#[tokio::test]
async fn second_purchase_is_blocked_while_subscription_active() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    let (body, signature) = captured_webhook(&order_id, "pay_live1");
    fx.webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();

    let err = fx
        .create_order
        .handle(CreateOrderCommand {
            user_id: fx.user_id,
            plan_id: fx.plan.id,
            addon_ids: vec![],
            billing_cycle: BillingCycle::Monthly,
            client_total: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::ActiveSubscriptionExists));
}

#[tokio::test]
async fn refund_cancels_subscription_and_unblocks_purchase() {
    let fx = Fixture::new();
    let order_id = fx.place_order().await;

    let (body, signature) = captured_webhook(&order_id, "pay_live1");
    fx.webhook
        .handle(ProcessWebhookCommand { body, signature })
        .await
        .unwrap();

    let payment = fx.payments.by_order(&order_id).unwrap();
    let result = fx
        .refund
        .handle(RefundPaymentCommand {
            payment_id: payment.id,
            amount: None,
            reason: None,
        })
        .await
        .unwrap();
    assert!(result.subscription_cancelled);
    assert_eq!(fx.gateway.refunds.lock().unwrap().len(), 1);

    assert_eq!(
        fx.payments.by_order(&order_id).unwrap().status,
        PaymentStatus::Refunded
    );
    let cancelled = fx.subscriptions.for_user(fx.user_id).unwrap();
    assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("Subscription cancellation")
    );

    // With the blocking subscription gone, the user can purchase again
    let second = fx
        .create_order
        .handle(CreateOrderCommand {
            user_id: fx.user_id,
            plan_id: fx.plan.id,
            addon_ids: vec![],
            billing_cycle: BillingCycle::Monthly,
            client_total: None,
        })
        .await;
    assert!(second.is_ok());
}
