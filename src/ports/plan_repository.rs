//! Plan and addon catalog ports.

use async_trait::async_trait;

use crate::domain::billing::{AddonService, BillingError, Plan};
use crate::domain::foundation::{AddonId, PlanId};

/// Port for reading plans and maintaining their subscriber counters.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Find a plan by id, active or not.
    async fn find_by_id(&self, id: PlanId) -> Result<Option<Plan>, BillingError>;

    /// Atomically bump a plan's subscriber counter by one.
    ///
    /// The increment happens in storage, never read-modify-write, so
    /// concurrent activations cannot lose counts.
    async fn increment_subscriber_count(&self, id: PlanId) -> Result<(), BillingError>;
}

/// Port for reading addon services.
#[async_trait]
pub trait AddonRepository: Send + Sync {
    /// Find the active addons among `ids`.
    ///
    /// Inactive or unknown ids are absent from the result; the caller decides
    /// whether that is an error.
    async fn find_active_by_ids(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, BillingError>;
}
