//! Tax policy applied to check subtotals.
//!
//! Rates are expressed in basis points (`825` = 8.25%) so the computation
//! stays in integers. Each check gets its tax computed from its own subtotal;
//! tax is never divided proportionally from the order's already rounded tax.

use serde::{Deserialize, Serialize};

use crate::MoneyCents;

const BPS_DENOMINATOR: i128 = 10_000;

/// A single named rate, e.g. a state and a city sales tax.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub name: String,
    pub basis_points: u32,
}

impl TaxRate {
    pub fn new(name: impl Into<String>, basis_points: u32) -> Self {
        Self {
            name: name.into(),
            basis_points,
        }
    }

    /// Tax owed on `subtotal`, rounded half away from zero to the cent.
    pub fn tax_on(&self, subtotal: MoneyCents) -> MoneyCents {
        let scaled = i128::from(subtotal.cents()) * i128::from(self.basis_points);
        let half = BPS_DENOMINATOR / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_DENOMINATOR
        } else {
            (scaled - half) / BPS_DENOMINATOR
        };
        MoneyCents::new(i64::try_from(rounded).unwrap_or(if rounded > 0 {
            i64::MAX
        } else {
            i64::MIN
        }))
    }
}

/// All rates applicable to an order. An empty policy means prices are
/// tax-inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    #[serde(default)]
    pub rates: Vec<TaxRate>,
}

impl TaxPolicy {
    pub fn new(rates: Vec<TaxRate>) -> Self {
        Self { rates }
    }

    pub fn inclusive() -> Self {
        Self::default()
    }

    /// Each rate rounds on its own, then the results are added (saturating).
    pub fn tax_on(&self, subtotal: MoneyCents) -> MoneyCents {
        let cents = self
            .rates
            .iter()
            .fold(0i64, |acc, rate| acc.saturating_add(rate.tax_on(subtotal).cents()));
        MoneyCents::new(cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        let rate = TaxRate::new("sales", 1000);
        assert_eq!(rate.tax_on(MoneyCents::new(105)), MoneyCents::new(11));
        assert_eq!(rate.tax_on(MoneyCents::new(104)), MoneyCents::new(10));
        assert_eq!(rate.tax_on(MoneyCents::new(-105)), MoneyCents::new(-11));
    }

    #[test]
    fn fractional_rate() {
        let rate = TaxRate::new("state", 825);
        assert_eq!(rate.tax_on(MoneyCents::new(1099)), MoneyCents::new(91));
    }

    #[test]
    fn policy_rounds_each_rate_separately() {
        let policy = TaxPolicy::new(vec![TaxRate::new("state", 625), TaxRate::new("city", 200)]);
        // 6.25% of 10.10 = 0.63125 -> 0.63; 2% of 10.10 = 0.202 -> 0.20
        assert_eq!(policy.tax_on(MoneyCents::new(1010)), MoneyCents::new(83));
    }

    #[test]
    fn inclusive_policy_adds_nothing() {
        assert_eq!(
            TaxPolicy::inclusive().tax_on(MoneyCents::new(4700)),
            MoneyCents::ZERO
        );
    }
}
