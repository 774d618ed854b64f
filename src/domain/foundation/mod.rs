//! Foundation value objects shared by every domain module.

mod auth;
mod errors;
mod ids;
mod money;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::ErrorCode;
pub use ids::{AddonId, PaymentId, PlanId, SubscriptionId, UserId};
pub use money::{Currency, Money};
pub use timestamp::Timestamp;
