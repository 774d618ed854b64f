//! Order pricing.
//!
//! The server recomputes every order total from the plan catalog and never
//! trusts a client-submitted amount outright. A small tolerance absorbs
//! rounding drift between the storefront and this service: a client total
//! within it is charged verbatim, anything beyond it is ignored in favor of
//! the server figure.

use crate::domain::foundation::Money;

use super::errors::BillingError;
use super::plan::{AddonService, BillingCycle, Plan};

/// Yearly price is ten monthly payments: subscribers get two months free.
const YEARLY_MONTHS_CHARGED: i64 = 10;

/// Default tolerance when comparing a client total to the server total,
/// in minor units.
pub const DEFAULT_AMOUNT_TOLERANCE: i64 = 10;

/// Line-item breakdown of an order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    /// Plan price for the chosen billing cycle.
    pub plan_amount: Money,
    /// Sum of addon prices.
    pub addon_amount: Money,
    pub total: Money,
    pub billing_cycle: BillingCycle,
}

/// Computes the charge for a plan on the chosen billing cycle.
///
/// A monthly-priced plan billed yearly is charged ten months instead of
/// twelve. A plan already priced per year is charged as listed, and a
/// yearly-priced plan cannot be billed monthly.
pub fn plan_amount(plan: &Plan, cycle: BillingCycle) -> Result<Money, BillingError> {
    match (plan.billing_period, cycle) {
        (BillingCycle::Monthly, BillingCycle::Monthly) => Ok(plan.price),
        (BillingCycle::Monthly, BillingCycle::Yearly) => {
            Ok(plan.price.times(YEARLY_MONTHS_CHARGED))
        }
        (BillingCycle::Yearly, BillingCycle::Yearly) => Ok(plan.price),
        (BillingCycle::Yearly, BillingCycle::Monthly) => Err(BillingError::validation(
            "billing_cycle",
            "Plan is priced yearly and cannot be billed monthly",
        )),
    }
}

/// Prices an order: plan charge for the cycle plus all addon prices.
pub fn price_order(
    plan: &Plan,
    addons: &[AddonService],
    cycle: BillingCycle,
) -> Result<PricedOrder, BillingError> {
    let plan_amount = plan_amount(plan, cycle)?;
    let addon_amount: Money = addons.iter().map(|a| a.price).sum();
    Ok(PricedOrder {
        plan_amount,
        addon_amount,
        total: plan_amount + addon_amount,
        billing_cycle: cycle,
    })
}

/// Picks the amount to charge given a client-submitted total.
///
/// A client total within the tolerance is charged verbatim so client-side
/// rounding never produces a visible discrepancy at checkout. Anything
/// further off falls back to the server figure; the client cannot move the
/// price. Called identically at order creation and verification so both
/// computations agree.
pub fn reconcile_client_total(computed: Money, client_total: Option<Money>, tolerance: i64) -> Money {
    match client_total {
        Some(claimed) if claimed.abs_diff(computed) < tolerance => claimed,
        _ => computed,
    }
}
