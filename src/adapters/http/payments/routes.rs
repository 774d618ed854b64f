//! Route definitions for the payments API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, PaymentsAppState};

/// Authenticated payment routes, mounted under `/api/payments`.
pub fn payment_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/orders", post(handlers::create_order))
        .route("/verify", post(handlers::verify_payment))
        .route("/status/:order_id", get(handlers::payment_status))
        .route("/history", get(handlers::payment_history))
        .route("/:payment_id/refund", post(handlers::refund_payment))
}

/// Gateway webhook routes, mounted under `/api/webhooks`. No bearer auth;
/// deliveries are authenticated by their HMAC signature instead.
pub fn webhook_routes() -> Router<PaymentsAppState> {
    Router::new().route("/razorpay", post(handlers::razorpay_webhook))
}

/// Combined payments router, suitable for mounting at `/api`.
pub fn payments_router() -> Router<PaymentsAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/webhooks", webhook_routes())
}
