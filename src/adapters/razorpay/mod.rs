//! Razorpay gateway adapters.

mod adapter;
mod fallback;
mod types;

pub use adapter::RazorpayAdapter;
pub use fallback::FallbackGateway;
