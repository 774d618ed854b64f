//! PostgreSQL implementation of the plan and addon catalog ports.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{AddonService, BillingCycle, BillingError, Plan};
use crate::domain::foundation::{AddonId, Currency, Money, PlanId};
use crate::ports::{AddonRepository, PlanRepository};

/// PostgreSQL implementation of the PlanRepository port.
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    price: i64,
    currency: String,
    billing_period: String,
    listing_limit: Option<i32>,
    photo_limit: Option<i32>,
    featured_listings: bool,
    subscriber_count: i64,
    is_active: bool,
}

impl TryFrom<PlanRow> for Plan {
    type Error = BillingError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let currency = Currency::parse(&row.currency)
            .ok_or_else(|| BillingError::database(format!("invalid currency '{}'", row.currency)))?;
        let billing_period = BillingCycle::parse(&row.billing_period).ok_or_else(|| {
            BillingError::database(format!("invalid billing period '{}'", row.billing_period))
        })?;

        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            price: Money::from_minor(row.price),
            currency,
            billing_period,
            listing_limit: row.listing_limit.map(|v| v as u32),
            photo_limit: row.photo_limit.map(|v| v as u32),
            featured_listings: row.featured_listings,
            subscriber_count: row.subscriber_count,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn find_by_id(&self, id: PlanId) -> Result<Option<Plan>, BillingError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, currency, billing_period, listing_limit,
                   photo_limit, featured_listings, subscriber_count, is_active
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Plan::try_from).transpose()
    }

    async fn increment_subscriber_count(&self, id: PlanId) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            UPDATE plans
            SET subscriber_count = subscriber_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// PostgreSQL implementation of the AddonRepository port.
pub struct PostgresAddonRepository {
    pool: PgPool,
}

impl PostgresAddonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddonRow {
    id: Uuid,
    name: String,
    price: i64,
    category: String,
    is_active: bool,
}

impl From<AddonRow> for AddonService {
    fn from(row: AddonRow) -> Self {
        AddonService {
            id: AddonId::from_uuid(row.id),
            name: row.name,
            price: Money::from_minor(row.price),
            category: row.category,
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl AddonRepository for PostgresAddonRepository {
    async fn find_active_by_ids(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, BillingError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|a| *a.as_uuid()).collect();
        let rows: Vec<AddonRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, category, is_active
            FROM addon_services
            WHERE id = ANY($1) AND is_active = TRUE
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AddonService::from).collect())
    }
}
