//! PostgreSQL adapters for the persistence ports.

mod payment_repository;
mod plan_repository;
mod subscription_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use plan_repository::{PostgresAddonRepository, PostgresPlanRepository};
pub use subscription_repository::PostgresSubscriptionRepository;
