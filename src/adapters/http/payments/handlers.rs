//! HTTP handlers for the payments API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::application::handlers::payments::{
    CreateOrderCommand, CreateOrderHandler, GetPaymentStatusHandler, GetPaymentStatusQuery,
    ProcessWebhookCommand, ProcessWebhookHandler, RefundPaymentCommand, RefundPaymentHandler,
    SubscriptionActivator, VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};
use crate::domain::billing::{BillingError, PaymentSignatureVerifier};
use crate::domain::foundation::{AddonId, ErrorCode, Money, PaymentId, PlanId};
use crate::adapters::http::middleware::{RequireAdmin, RequireAuth};
use crate::ports::{
    AddonRepository, PaymentGateway, PaymentRepository, PlanRepository, SubscriptionRepository,
};

use super::dto::{
    checkout_response, parse_billing_cycle, CreateOrderRequest, ErrorResponse, PaymentResponse,
    RefundPaymentRequest, RefundPaymentResponse, SubscriptionResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};

/// Signature header set by the gateway on webhook deliveries.
const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Shared state for the payments routes.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub plans: Arc<dyn PlanRepository>,
    pub addons: Arc<dyn AddonRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<PaymentSignatureVerifier>,
    pub amount_tolerance: i64,
    /// Public gateway key id, returned to checkout so the widget can open.
    pub key_id: String,
}

impl PaymentsAppState {
    fn activator(&self) -> Arc<SubscriptionActivator> {
        Arc::new(SubscriptionActivator::new(
            self.plans.clone(),
            self.subscriptions.clone(),
        ))
    }

    fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.plans.clone(),
            self.addons.clone(),
            self.subscriptions.clone(),
            self.payments.clone(),
            self.gateway.clone(),
            self.amount_tolerance,
        )
    }

    fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.payments.clone(),
            self.verifier.clone(),
            self.activator(),
        )
    }

    fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.payments.clone(),
            self.verifier.clone(),
            self.activator(),
        )
    }

    fn status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.payments.clone(), self.gateway.clone())
    }

    fn refund_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(
            self.payments.clone(),
            self.subscriptions.clone(),
            self.gateway.clone(),
        )
    }
}

/// Maps billing errors onto HTTP responses.
pub struct BillingApiError(pub BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match err.code() {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat | ErrorCode::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::PlanNotFound
            | ErrorCode::AddonNotFound
            | ErrorCode::PaymentNotFound
            | ErrorCode::SubscriptionNotFound
            | ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ActiveSubscriptionExists | ErrorCode::InvalidStateTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::GatewayUnavailable | ErrorCode::GatewayRejected => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Server faults are logged in full but reported generically.
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            error!(error = %err, "payments request failed");
            "An internal error occurred".to_string()
        };

        (
            status,
            Json(ErrorResponse::new(err.code().to_string(), message)),
        )
            .into_response()
    }
}

fn parse_plan_id(value: &str) -> Result<PlanId, BillingApiError> {
    value
        .parse()
        .map_err(|_| BillingError::validation("plan_id", "must be a valid UUID").into())
}

fn parse_addon_ids(values: &[String]) -> Result<Vec<AddonId>, BillingApiError> {
    values
        .iter()
        .map(|v| {
            v.parse()
                .map_err(|_| BillingError::validation("addon_ids", "must be valid UUIDs").into())
        })
        .collect()
}

/// POST /api/payments/orders
pub async fn create_order(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let billing_cycle = parse_billing_cycle(&body.billing_cycle)
        .map_err(|msg| BillingError::validation("billing_cycle", msg))?;

    let cmd = CreateOrderCommand {
        user_id: user.user_id,
        plan_id: parse_plan_id(&body.plan_id)?,
        addon_ids: parse_addon_ids(&body.addon_ids)?,
        billing_cycle,
        client_total: body.client_total.map(Money::from_minor),
    };

    let result = state.create_order_handler().handle(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(checkout_response(&result.order, &result.payment, &state.key_id)),
    ))
}

/// POST /api/payments/verify
pub async fn verify_payment(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = VerifyPaymentCommand {
        user_id: user.user_id,
        order_id: body.razorpay_order_id,
        gateway_payment_id: body.razorpay_payment_id,
        signature: body.razorpay_signature,
    };

    let response = match state.verify_payment_handler().handle(cmd).await? {
        VerifyPaymentResult::Activated { subscription } => VerifyPaymentResponse {
            status: "success",
            subscription: Some(SubscriptionResponse::from(&subscription)),
        },
        VerifyPaymentResult::AlreadyProcessed { .. } => VerifyPaymentResponse {
            status: "already_processed",
            subscription: None,
        },
    };
    Ok(Json(response))
}

/// POST /api/webhooks/razorpay
///
/// Takes the raw body because the signature covers the exact bytes the
/// gateway sent. Every recognized outcome is acknowledged with 200 so the
/// gateway stops redelivering; only signature and parse failures bounce.
pub async fn razorpay_webhook(
    State(state): State<PaymentsAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BillingError::validation("signature", "missing signature header"))?
        .to_string();

    state
        .webhook_handler()
        .handle(ProcessWebhookCommand {
            body: body.to_vec(),
            signature,
        })
        .await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// GET /api/payments/status/:order_id
pub async fn payment_status(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let view = state
        .status_handler()
        .handle(GetPaymentStatusQuery {
            user_id: user.user_id,
            order_id,
        })
        .await?;

    let mut response = PaymentResponse::from(&view.payment);
    response.gateway_status = view.gateway_status.map(|s| s.status);
    Ok(Json(response))
}

/// GET /api/payments/history
pub async fn payment_history(
    State(state): State<PaymentsAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let payments = state.status_handler().history(user.user_id).await?;
    let response: Vec<PaymentResponse> = payments.iter().map(PaymentResponse::from).collect();
    Ok(Json(response))
}

/// POST /api/payments/:payment_id/refund (admin only)
pub async fn refund_payment(
    State(state): State<PaymentsAppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(payment_id): Path<String>,
    Json(body): Json<RefundPaymentRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let payment_id: PaymentId = payment_id
        .parse()
        .map_err(|_| BillingError::validation("payment_id", "must be a valid UUID"))?;

    let result = state
        .refund_handler()
        .handle(RefundPaymentCommand {
            payment_id,
            amount: body.amount.map(Money::from_minor),
            reason: body.reason,
        })
        .await?;

    Ok(Json(RefundPaymentResponse {
        payment_id: result.payment_id.to_string(),
        refund_id: result.refund.refund_id,
        amount: result.refund.amount,
        reason: result.refund.reason,
        subscription_cancelled: result.subscription_cancelled,
    }))
}
