//! PostgreSQL implementation of SubscriptionRepository.
//!
//! One row per user, enforced by a unique constraint; activation replaces
//! whatever the user held through an upsert on that constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{
    BillingCycle, BillingError, Subscription, SubscriptionStatus, TransitionOutcome,
};
use crate::domain::foundation::{
    AddonId, Currency, Money, PaymentId, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    payment_id: Uuid,
    addon_ids: Vec<Uuid>,
    amount: i64,
    currency: String,
    billing_cycle: String,
    status: String,
    auto_renew: bool,
    starts_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_payment_at: DateTime<Utc>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = BillingError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status)
            .ok_or_else(|| BillingError::database(format!("invalid status '{}'", row.status)))?;
        let billing_cycle = BillingCycle::parse(&row.billing_cycle).ok_or_else(|| {
            BillingError::database(format!("invalid billing cycle '{}'", row.billing_cycle))
        })?;
        let currency = Currency::parse(&row.currency).ok_or_else(|| {
            BillingError::database(format!("invalid currency '{}'", row.currency))
        })?;

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            payment_id: PaymentId::from_uuid(row.payment_id),
            addon_ids: row.addon_ids.into_iter().map(AddonId::from_uuid).collect(),
            amount: Money::from_minor(row.amount),
            currency,
            billing_cycle,
            status,
            auto_renew: row.auto_renew,
            starts_at: Timestamp::from_datetime(row.starts_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
            last_payment_at: Timestamp::from_datetime(row.last_payment_at),
            cancellation_reason: row.cancellation_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, plan_id, payment_id, addon_ids, amount, currency, \
     billing_cycle, status, auto_renew, starts_at, expires_at, last_payment_at, \
     cancellation_reason, created_at, updated_at";

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, BillingError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_blocking_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, BillingError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 AND status IN ('pending', 'active')",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn upsert_for_user(&self, subscription: &Subscription) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, payment_id, addon_ids, amount, currency,
                billing_cycle, status, auto_renew, starts_at, expires_at,
                last_payment_at, cancellation_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (user_id) DO UPDATE SET
                id = EXCLUDED.id,
                plan_id = EXCLUDED.plan_id,
                payment_id = EXCLUDED.payment_id,
                addon_ids = EXCLUDED.addon_ids,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                billing_cycle = EXCLUDED.billing_cycle,
                status = EXCLUDED.status,
                auto_renew = EXCLUDED.auto_renew,
                starts_at = EXCLUDED.starts_at,
                expires_at = EXCLUDED.expires_at,
                last_payment_at = EXCLUDED.last_payment_at,
                cancellation_reason = EXCLUDED.cancellation_reason,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(subscription.plan_id.as_uuid())
        .bind(subscription.payment_id.as_uuid())
        .bind(
            subscription
                .addon_ids
                .iter()
                .map(|a| *a.as_uuid())
                .collect::<Vec<Uuid>>(),
        )
        .bind(subscription.amount.minor())
        .bind(subscription.currency.as_str())
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.auto_renew)
        .bind(subscription.starts_at.as_datetime())
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.last_payment_at.as_datetime())
        .bind(&subscription.cancellation_reason)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel(
        &self,
        id: SubscriptionId,
        reason: &str,
    ) -> Result<TransitionOutcome, BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled',
                auto_renew = FALSE,
                cancellation_reason = $2,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'active')
            "#,
        )
        .bind(id.as_uuid())
        .bind(reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }

        let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM subscriptions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(if exists.is_some() {
            TransitionOutcome::NoOp
        } else {
            TransitionOutcome::NotFound
        })
    }
}
