//! Money value object.
//!
//! All amounts are stored in the currency's minor unit (paise for INR) so
//! pricing arithmetic stays in integers. The gateway wire format is also the
//! minor unit, so no conversion happens at the adapter boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An amount of money in minor currency units (e.g. paise).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units (paise).
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from major units (rupees).
    pub fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Absolute difference between two amounts, in minor units.
    pub fn abs_diff(&self, other: Money) -> i64 {
        (self.0 - other.0).abs()
    }

    /// Multiplies the amount by an integer factor.
    pub fn times(&self, factor: i64) -> Self {
        Self(self.0 * factor)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO-ish currency code accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn parse(s: &str) -> Option<Currency> {
        match s {
            "INR" => Some(Currency::Inr),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_converts_to_paise() {
        assert_eq!(Money::from_major(2499).minor(), 249_900);
    }

    #[test]
    fn times_scales_amount() {
        assert_eq!(Money::from_major(2499).times(10), Money::from_major(24_990));
    }

    #[test]
    fn sum_of_addon_prices() {
        let total: Money = [Money::from_major(500), Money::from_major(300)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_major(800));
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Money::from_minor(2_499_005);
        let b = Money::from_minor(2_499_000);
        assert_eq!(a.abs_diff(b), 5);
        assert_eq!(b.abs_diff(a), 5);
    }

    #[test]
    fn currency_round_trips() {
        assert_eq!(Currency::parse("INR"), Some(Currency::Inr));
        assert_eq!(Currency::Inr.as_str(), "INR");
        assert_eq!(Currency::parse("GBP"), None);
    }

    #[test]
    fn currency_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Currency::Inr).unwrap(), "\"INR\"");
    }
}
