//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod payments;

pub use payments::{payments_router, PaymentsAppState};
