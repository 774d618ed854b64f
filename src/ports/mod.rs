//! Ports: trait contracts between the application core and its adapters.

mod payment_gateway;
mod payment_repository;
mod plan_repository;
mod subscription_repository;

pub use payment_gateway::{
    CreateOrderRequest, GatewayError, GatewayPayment, OrderRef, PaymentGateway, RefundRef,
    RefundRequest,
};
pub use payment_repository::PaymentRepository;
pub use plan_repository::{AddonRepository, PlanRepository};
pub use subscription_repository::SubscriptionRepository;
