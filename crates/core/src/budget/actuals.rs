//! Sources of actual spend used when a period is seeded.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;

use super::types::BudgetCategory;

/// Supplies the starting actual spend of a category.
pub trait ActualsSource: Send + Sync {
    /// Actual spend to date for `category`.
    fn actual_for(&mut self, category: &BudgetCategory) -> Decimal;
}

/// Demo data: actual spend drawn uniformly from 80% to 120% of budget.
///
/// Seed it for reproducible figures.
pub struct RandomActuals {
    rng: StdRng,
}

impl RandomActuals {
    /// Lower bound of the spend factor, in thousandths.
    const MIN_FACTOR: i64 = 800;
    /// Upper bound of the spend factor, in thousandths.
    const MAX_FACTOR: i64 = 1200;

    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl ActualsSource for RandomActuals {
    fn actual_for(&mut self, category: &BudgetCategory) -> Decimal {
        let factor = Decimal::new(
            self.rng.random_range(Self::MIN_FACTOR..=Self::MAX_FACTOR),
            3,
        );
        (category.default_budget * factor).round_dp(2)
    }
}

/// Actual spend read from an external ledger, keyed by category code.
///
/// Categories absent from the ledger have spent nothing.
#[derive(Debug, Clone, Default)]
pub struct LedgerActuals {
    by_code: HashMap<String, Decimal>,
}

impl LedgerActuals {
    /// Creates a source from `(category code, amount)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            by_code: entries.into_iter().collect(),
        }
    }
}

impl ActualsSource for LedgerActuals {
    fn actual_for(&mut self, category: &BudgetCategory) -> Decimal {
        self.by_code
            .get(&category.code)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::catalog::budget_categories;
    use rust_decimal_macros::dec;

    #[test]
    fn test_seeded_actuals_reproducible() {
        let categories = budget_categories();
        let mut first = RandomActuals::seeded(7);
        let mut second = RandomActuals::seeded(7);

        for category in &categories {
            assert_eq!(first.actual_for(category), second.actual_for(category));
        }
    }

    #[test]
    fn test_random_actuals_within_band() {
        let mut source = RandomActuals::seeded(11);

        for category in budget_categories() {
            for _ in 0..20 {
                let actual = source.actual_for(&category);
                assert!(actual >= category.default_budget * dec!(0.8), "{actual}");
                assert!(actual <= category.default_budget * dec!(1.2), "{actual}");
            }
        }
    }

    #[test]
    fn test_ledger_actuals_by_code() {
        let categories = budget_categories();
        let mut source = LedgerActuals::new([("OPEX-001".to_string(), dec!(900000))]);

        assert_eq!(source.actual_for(&categories[0]), dec!(900000));
        assert_eq!(source.actual_for(&categories[1]), Decimal::ZERO);
    }
}
