//! Budget variance calculations.

use opexa_shared::types::BudgetCategoryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::BudgetItem;

const LOW_LIMIT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
const MEDIUM_LIMIT: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
const HIGH_LIMIT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Returns `part / whole * 100`.
///
/// A zero `whole` yields `0` rather than failing. This is the documented
/// sentinel for variance and utilization percentages of an empty budget.
#[must_use]
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}

/// Direction of a variance for an expense budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceTrend {
    /// Spend is under budget.
    Favorable,
    /// Spend is over budget.
    Unfavorable,
    /// Spend equals budget.
    Neutral,
}

impl VarianceTrend {
    /// Classifies a variance amount (actual - budgeted).
    #[must_use]
    pub fn from_variance(variance: Decimal) -> Self {
        match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Less => Self::Favorable,
            std::cmp::Ordering::Greater => Self::Unfavorable,
            std::cmp::Ordering::Equal => Self::Neutral,
        }
    }
}

/// How far a category has drifted from its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceSeverity {
    /// |variance %| < 5.
    Low,
    /// 5 <= |variance %| < 15.
    Medium,
    /// 15 <= |variance %| < 25.
    High,
    /// |variance %| >= 25.
    Critical,
}

impl VarianceSeverity {
    /// Buckets a variance percentage by its absolute value.
    #[must_use]
    pub fn from_percentage(variance_percentage: Decimal) -> Self {
        let magnitude = variance_percentage.abs();
        if magnitude < LOW_LIMIT {
            Self::Low
        } else if magnitude < MEDIUM_LIMIT {
            Self::Medium
        } else if magnitude < HIGH_LIMIT {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// Budget vs actual variance of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVariance {
    /// Category ID.
    pub category_id: BudgetCategoryId,
    /// Category name.
    pub category_name: String,
    /// Budgeted amount.
    pub budgeted: Decimal,
    /// Actual amount.
    pub actual: Decimal,
    /// Variance amount (actual - budgeted).
    pub variance_amount: Decimal,
    /// Variance percentage.
    pub variance_percentage: Decimal,
    /// Direction of the variance.
    pub trend: VarianceTrend,
    /// Severity tier.
    pub severity: VarianceSeverity,
}

impl BudgetVariance {
    /// Builds the variance view of an item.
    #[must_use]
    pub fn for_item(item: &BudgetItem) -> Self {
        Self {
            category_id: item.category_id,
            category_name: item.category_name.clone(),
            budgeted: item.budgeted_amount,
            actual: item.actual_amount,
            variance_amount: item.variance_amount,
            variance_percentage: item.variance_percentage,
            trend: VarianceTrend::from_variance(item.variance_amount),
            severity: VarianceSeverity::from_percentage(item.variance_percentage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), VarianceSeverity::Low)]
    #[case(dec!(4.99), VarianceSeverity::Low)]
    #[case(dec!(5), VarianceSeverity::Medium)]
    #[case(dec!(-5), VarianceSeverity::Medium)]
    #[case(dec!(14.99), VarianceSeverity::Medium)]
    #[case(dec!(15), VarianceSeverity::High)]
    #[case(dec!(-24.99), VarianceSeverity::High)]
    #[case(dec!(25), VarianceSeverity::Critical)]
    #[case(dec!(-25), VarianceSeverity::Critical)]
    #[case(dec!(300), VarianceSeverity::Critical)]
    fn test_severity_tiers(#[case] percentage: Decimal, #[case] expected: VarianceSeverity) {
        assert_eq!(VarianceSeverity::from_percentage(percentage), expected);
    }

    #[rstest]
    #[case(dec!(-1), VarianceTrend::Favorable)]
    #[case(dec!(0), VarianceTrend::Neutral)]
    #[case(dec!(0.01), VarianceTrend::Unfavorable)]
    fn test_trend(#[case] variance: Decimal, #[case] expected: VarianceTrend) {
        assert_eq!(VarianceTrend::from_variance(variance), expected);
    }

    #[test]
    fn test_percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage_of(dec!(500), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(-30), dec!(300)), dec!(-10));
        assert_eq!(percentage_of(dec!(270), dec!(300)), dec!(90));
    }
}
