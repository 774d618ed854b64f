//! PostgreSQL implementation of PaymentRepository.
//!
//! Settlement transitions are single guarded UPDATE statements whose WHERE
//! clause includes the current status; the row count tells the caller whether
//! the transition applied, was a duplicate, or targeted a missing payment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{
    BillingCycle, BillingError, FailureDetails, Payment, PaymentStatus, RefundDetails,
    TransitionOutcome,
};
use crate::domain::foundation::{AddonId, Money, PaymentId, PlanId, Timestamp, UserId};
use crate::ports::PaymentRepository;

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a zero-row guarded update into NoOp or NotFound.
    async fn classify_miss(&self, order_exists_query: bool, key: &str) -> Result<TransitionOutcome, BillingError> {
        let exists: Option<(i32,)> = if order_exists_query {
            sqlx::query_as("SELECT 1 FROM payments WHERE order_id = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?
        } else {
            let id = Uuid::parse_str(key)
                .map_err(|e| BillingError::database(format!("invalid payment id: {}", e)))?;
            sqlx::query_as("SELECT 1 FROM payments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
        };
        Ok(if exists.is_some() {
            TransitionOutcome::NoOp
        } else {
            TransitionOutcome::NotFound
        })
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    addon_ids: Vec<Uuid>,
    order_id: String,
    gateway_payment_id: Option<String>,
    amount: i64,
    billing_cycle: String,
    status: String,
    failure_description: Option<String>,
    failure_reason: Option<String>,
    refund_id: Option<String>,
    refund_amount: Option<i64>,
    refund_reason: Option<String>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = BillingError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status)
            .ok_or_else(|| BillingError::database(format!("invalid status '{}'", row.status)))?;
        let billing_cycle = BillingCycle::parse(&row.billing_cycle).ok_or_else(|| {
            BillingError::database(format!("invalid billing cycle '{}'", row.billing_cycle))
        })?;

        let failure = match (row.failure_description, row.failure_reason) {
            (None, None) => None,
            (description, reason) => Some(FailureDetails {
                description,
                reason,
            }),
        };

        let refund = match (row.refund_id, row.refund_amount, row.refunded_at) {
            (Some(refund_id), Some(amount), Some(refunded_at)) => Some(RefundDetails {
                refund_id,
                amount: Money::from_minor(amount),
                reason: row.refund_reason.unwrap_or_default(),
                refunded_at: Timestamp::from_datetime(refunded_at),
            }),
            _ => None,
        };

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            addon_ids: row.addon_ids.into_iter().map(AddonId::from_uuid).collect(),
            order_id: row.order_id,
            gateway_payment_id: row.gateway_payment_id,
            amount: Money::from_minor(row.amount),
            billing_cycle,
            status,
            failure,
            refund,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, plan_id, addon_ids, order_id, gateway_payment_id, \
     amount, billing_cycle, status, failure_description, failure_reason, \
     refund_id, refund_amount, refund_reason, refunded_at, created_at, updated_at";

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), BillingError> {
        let addon_ids: Vec<Uuid> = payment.addon_ids.iter().map(|a| *a.as_uuid()).collect();
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, plan_id, addon_ids, order_id, gateway_payment_id,
                amount, billing_cycle, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.plan_id.as_uuid())
        .bind(&addon_ids)
        .bind(&payment.order_id)
        .bind(&payment.gateway_payment_id)
        .bind(payment.amount.minor())
        .bind(payment.billing_cycle.as_str())
        .bind(payment.status.as_str())
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, BillingError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, BillingError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE order_id = $1",
            SELECT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, BillingError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn attach_gateway_payment_id(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<TransitionOutcome, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET gateway_payment_id = $2,
                updated_at = NOW()
            WHERE order_id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.classify_miss(true, order_id).await
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> Result<TransitionOutcome, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'paid',
                gateway_payment_id = COALESCE($2, gateway_payment_id),
                updated_at = NOW()
            WHERE order_id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.classify_miss(true, order_id).await
    }

    async fn mark_failed(
        &self,
        order_id: &str,
        gateway_payment_id: Option<&str>,
        failure: &FailureDetails,
    ) -> Result<TransitionOutcome, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed',
                gateway_payment_id = COALESCE($2, gateway_payment_id),
                failure_description = $3,
                failure_reason = $4,
                updated_at = NOW()
            WHERE order_id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(gateway_payment_id)
        .bind(&failure.description)
        .bind(&failure.reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.classify_miss(true, order_id).await
    }

    async fn mark_refunded(
        &self,
        id: PaymentId,
        refund: &RefundDetails,
    ) -> Result<TransitionOutcome, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'refunded',
                refund_id = $2,
                refund_amount = $3,
                refund_reason = $4,
                refunded_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = 'paid'
            "#,
        )
        .bind(id.as_uuid())
        .bind(&refund.refund_id)
        .bind(refund.amount.minor())
        .bind(&refund.reason)
        .bind(refund.refunded_at.as_datetime())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.classify_miss(false, &id.to_string()).await
    }
}
