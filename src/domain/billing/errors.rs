//! Billing errors.

use crate::domain::foundation::ErrorCode;

use super::payment::PaymentStatus;
use super::signature::SignatureError;

/// Errors raised by billing operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BillingError {
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Plan not found")]
    PlanNotFound,

    #[error("Addon service not found or inactive")]
    AddonNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("User already has an active subscription")]
    ActiveSubscriptionExists,

    #[error("Payment signature verification failed")]
    InvalidSignature(#[source] SignatureError),

    #[error("Payment is {status:?} and cannot be refunded")]
    RefundNotAllowed { status: PaymentStatus },

    #[error("Payment gateway is unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment gateway rejected the request: {0}")]
    GatewayRejected(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        BillingError::Database(message.into())
    }

    /// Stable machine-readable code for API responses and logs.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::Validation { .. } => ErrorCode::ValidationFailed,
            BillingError::PlanNotFound => ErrorCode::PlanNotFound,
            BillingError::AddonNotFound => ErrorCode::AddonNotFound,
            BillingError::PaymentNotFound => ErrorCode::PaymentNotFound,
            BillingError::SubscriptionNotFound => ErrorCode::SubscriptionNotFound,
            BillingError::ActiveSubscriptionExists => ErrorCode::ActiveSubscriptionExists,
            BillingError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            BillingError::RefundNotAllowed { .. } => ErrorCode::InvalidStateTransition,
            BillingError::GatewayUnavailable(_) => ErrorCode::GatewayUnavailable,
            BillingError::GatewayRejected(_) => ErrorCode::GatewayRejected,
            BillingError::Database(_) => ErrorCode::DatabaseError,
            BillingError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this error is the caller's fault rather than the service's.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            BillingError::GatewayUnavailable(_)
                | BillingError::Database(_)
                | BillingError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => BillingError::PaymentNotFound,
            other => BillingError::Database(other.to_string()),
        }
    }
}
