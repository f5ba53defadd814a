//! Departmental allocation of item budgets.
//!
//! Splits use the Largest Remainder Method so the department amounts of an
//! item always sum exactly to the item amount:
//! 1. Calculate exact shares
//! 2. Round each down to cents
//! 3. Hand the leftover cents to the shares with the largest fractional parts

use rust_decimal::prelude::*;

use super::error::BudgetError;

/// Decimal places of allocated amounts.
const AMOUNT_DP: u32 = 2;

/// One department's share of every item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentShare {
    /// Department name.
    pub department: String,
    /// Share in percent.
    pub percentage: Decimal,
}

/// The departmental split applied to every budget item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AllocationPlan {
    shares: Vec<DepartmentShare>,
}

impl AllocationPlan {
    /// Creates a plan. Percentages must be non-negative and sum to 100.
    ///
    /// An empty plan is valid and produces no allocations.
    pub fn new(shares: Vec<DepartmentShare>) -> Result<Self, BudgetError> {
        if shares.is_empty() {
            return Ok(Self { shares });
        }

        let total: Decimal = shares.iter().map(|s| s.percentage).sum();
        if total != Decimal::ONE_HUNDRED || shares.iter().any(|s| s.percentage.is_sign_negative()) {
            return Err(BudgetError::InvalidAllocationPlan(total));
        }

        Ok(Self { shares })
    }

    /// Returns the shares in plan order.
    #[must_use]
    pub fn shares(&self) -> &[DepartmentShare] {
        &self.shares
    }

    /// Splits `total` across the plan's departments.
    #[must_use]
    pub fn split(&self, total: Decimal) -> Vec<Decimal> {
        let percentages: Vec<Decimal> = self.shares.iter().map(|s| s.percentage).collect();
        split_by_percentages(total, &percentages)
    }
}

/// Splits `total` by percentages, to cents, with an exact sum.
///
/// Percentages are expected to sum to 100.
#[must_use]
pub fn split_by_percentages(total: Decimal, percentages: &[Decimal]) -> Vec<Decimal> {
    if percentages.is_empty() {
        return vec![];
    }

    let unit = Decimal::new(1, AMOUNT_DP);
    let total_rounded =
        total.round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::MidpointNearestEven);

    let exact: Vec<Decimal> = percentages
        .iter()
        .map(|p| total_rounded * *p / Decimal::ONE_HUNDRED)
        .collect();

    let mut rounded: Vec<Decimal> = exact
        .iter()
        .map(|a| a.round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::ToZero))
        .collect();

    let sum_rounded: Decimal = rounded.iter().copied().sum();
    let units_to_distribute = ((total_rounded - sum_rounded) / unit)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_usize()
        .unwrap_or(0);

    if units_to_distribute == 0 {
        return rounded;
    }

    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(rounded.iter())
        .enumerate()
        .map(|(i, (e, r))| (i, *e - *r))
        .collect();

    // Largest fractional part first; ties keep plan order.
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    for (idx, _) in remainders.iter().take(units_to_distribute) {
        rounded[*idx] += unit;
    }

    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn share(department: &str, percentage: Decimal) -> DepartmentShare {
        DepartmentShare {
            department: department.to_string(),
            percentage,
        }
    }

    #[test]
    fn test_split_empty() {
        assert!(split_by_percentages(dec!(100), &[]).is_empty());
    }

    #[test]
    fn test_split_uneven() {
        let result = split_by_percentages(dec!(100), &[dec!(50), dec!(30), dec!(20)]);
        assert_eq!(result, vec![dec!(50), dec!(30), dec!(20)]);
    }

    #[test]
    fn test_split_thirds_keeps_every_cent() {
        let result = split_by_percentages(dec!(100), &[dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(result.iter().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_split_sum_invariant() {
        let cases = [
            (dec!(850000), vec![dec!(40), dec!(45), dec!(15)]),
            (dec!(99.99), vec![dec!(10), dec!(20), dec!(30), dec!(40)]),
            (dec!(0.01), vec![dec!(40), dec!(45), dec!(15)]),
            (dec!(1234.57), vec![dec!(12.5), dec!(87.5)]),
        ];

        for (total, percentages) in cases {
            let result = split_by_percentages(total, &percentages);
            assert_eq!(
                result.iter().sum::<Decimal>(),
                total,
                "Sum invariant failed for total={total}, percentages={percentages:?}"
            );
        }
    }

    #[test]
    fn test_plan_rejects_bad_total() {
        let result = AllocationPlan::new(vec![share("A", dec!(60)), share("B", dec!(30))]);
        assert!(matches!(result, Err(BudgetError::InvalidAllocationPlan(t)) if t == dec!(90)));
    }

    #[test]
    fn test_plan_rejects_negative_share() {
        let result = AllocationPlan::new(vec![share("A", dec!(120)), share("B", dec!(-20))]);
        assert!(matches!(result, Err(BudgetError::InvalidAllocationPlan(_))));
    }

    #[test]
    fn test_empty_plan_splits_nothing() {
        let plan = AllocationPlan::new(vec![]).unwrap();
        assert!(plan.split(dec!(500)).is_empty());
    }

    #[test]
    fn test_plan_split() {
        let plan =
            AllocationPlan::new(vec![share("Head Office", dec!(40)), share("Field", dec!(60))])
                .unwrap();
        assert_eq!(plan.split(dec!(1000)), vec![dec!(400), dec!(600)]);
    }
}
