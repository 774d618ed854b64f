//! Payment aggregate and its state machine.
//!
//! A payment starts `pending` and settles exactly once. Confirmations arrive
//! over two channels (client callback and gateway webhook) in any order and
//! possibly more than once, so transitions out of `pending` are the only
//! transitions allowed; re-applying a settled outcome is a no-op, and
//! conflicting outcomes after settlement are ignored. `Paid -> Refunded` is
//! the single post-settlement move, driven by an operator.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AddonId, Money, PaymentId, PlanId, Timestamp, UserId};

use super::plan::BillingCycle;

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// Whether the payment has left `pending`.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Whether `self -> next` is a legal move.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }
}

/// Result of attempting a guarded state transition.
///
/// `NoOp` means the row existed but its status already precluded the move;
/// callers treat it as a duplicate confirmation, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    NoOp,
    NotFound,
}

/// Details recorded when a gateway reports a failed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FailureDetails {
    pub description: Option<String>,
    pub reason: Option<String>,
}

/// Details recorded when a payment is refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub refund_id: String,
    pub amount: Money,
    pub reason: String,
    pub refunded_at: Timestamp,
}

/// A payment record tied to one gateway order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    /// Gateway order id; the reconciliation key for both channels.
    pub order_id: String,
    /// Gateway payment id, once a confirmation names it.
    pub gateway_payment_id: Option<String>,
    pub amount: Money,
    pub billing_cycle: BillingCycle,
    pub status: PaymentStatus,
    pub failure: Option<FailureDetails>,
    pub refund: Option<RefundDetails>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a pending payment for a freshly placed order.
    pub fn new_pending(
        user_id: UserId,
        plan_id: PlanId,
        addon_ids: Vec<AddonId>,
        order_id: String,
        amount: Money,
        billing_cycle: BillingCycle,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentId::new(),
            user_id,
            plan_id,
            addon_ids,
            order_id,
            gateway_payment_id: None,
            amount,
            billing_cycle,
            status: PaymentStatus::Pending,
            failure: None,
            refund: None,
            created_at: now,
            updated_at: now,
        }
    }
}
