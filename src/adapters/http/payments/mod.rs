//! HTTP surface for orders, confirmations, webhooks, and refunds.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentsAppState;
pub use routes::{payment_routes, payments_router, webhook_routes};
