//! Portfolio-level budget reports, analyses and recommendations.

use chrono::{DateTime, Utc};
use opexa_shared::types::BudgetPeriodId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::forecast::{BudgetForecast, ForecastWindow};
use super::types::{BudgetItem, BudgetPeriod};
use super::variance::{BudgetVariance, percentage_of};

/// |variance %| above which a category is flagged for budget revision.
const HIGH_VARIANCE_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Sums across a set of budget items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetTotals {
    /// Sum of budgeted amounts.
    pub total_budget: Decimal,
    /// Sum of actual amounts.
    pub total_actual: Decimal,
    /// Sum of committed amounts.
    pub total_committed: Decimal,
    /// Sum of available amounts.
    pub total_available: Decimal,
}

impl BudgetTotals {
    /// Totals `items`.
    pub fn of<'a>(items: impl IntoIterator<Item = &'a BudgetItem>) -> Self {
        items.into_iter().fold(Self::default(), |mut acc, item| {
            acc.total_budget += item.budgeted_amount;
            acc.total_actual += item.actual_amount;
            acc.total_committed += item.committed_amount;
            acc.total_available += item.available_amount;
            acc
        })
    }

    /// total_actual - total_budget.
    #[must_use]
    pub fn variance(&self) -> Decimal {
        self.total_actual - self.total_budget
    }

    /// Variance as a percentage of total budget; 0 for an empty budget.
    #[must_use]
    pub fn variance_percentage(&self) -> Decimal {
        percentage_of(self.variance(), self.total_budget)
    }

    /// Actual spend as a percentage of total budget; 0 for an empty budget.
    #[must_use]
    pub fn utilization_rate(&self) -> Decimal {
        percentage_of(self.total_actual, self.total_budget)
    }
}

/// Budget report for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetReport {
    /// Report ID.
    pub id: Uuid,
    /// Period reported on.
    pub period_id: BudgetPeriodId,
    /// Period name.
    pub period_name: String,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Sum of budgeted amounts.
    pub total_budget: Decimal,
    /// Sum of actual amounts.
    pub total_actual: Decimal,
    /// Sum of committed amounts.
    pub total_committed: Decimal,
    /// Sum of available amounts.
    pub total_available: Decimal,
    /// total_actual - total_budget.
    pub total_variance: Decimal,
    /// total_variance / total_budget * 100.
    pub variance_percentage: Decimal,
    /// Per-category variances.
    pub variances: Vec<BudgetVariance>,
    /// Per-category forecasts.
    pub forecasts: Vec<BudgetForecast>,
}

/// Whole-portfolio analysis with recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    /// Sum of budgeted amounts.
    pub total_budget: Decimal,
    /// Sum of actual amounts.
    pub total_actual: Decimal,
    /// Sum of committed amounts.
    pub total_committed: Decimal,
    /// Sum of available amounts.
    pub total_available: Decimal,
    /// total_actual / total_budget * 100.
    pub utilization_rate: Decimal,
    /// Per-category variances.
    pub variance_analysis: Vec<BudgetVariance>,
    /// Per-category forecasts.
    pub forecast_analysis: Vec<BudgetForecast>,
    /// Categories spending more than budgeted.
    pub over_budget_categories: Vec<BudgetVariance>,
    /// Categories spending less than budgeted.
    pub under_budget_categories: Vec<BudgetVariance>,
    /// Advice synthesized from thresholds.
    pub recommendations: Vec<String>,
}

/// Service for generating budget reports.
pub struct BudgetReportService;

impl BudgetReportService {
    /// One variance per item, in item order.
    #[must_use]
    pub fn variances(items: &[&BudgetItem]) -> Vec<BudgetVariance> {
        items.iter().map(|item| BudgetVariance::for_item(item)).collect()
    }

    /// One forecast per item, in item order.
    #[must_use]
    pub fn forecasts(items: &[&BudgetItem], window: ForecastWindow) -> Vec<BudgetForecast> {
        items
            .iter()
            .map(|item| BudgetForecast::for_item(item, window))
            .collect()
    }

    /// Generates the period report.
    #[must_use]
    pub fn generate_report(
        period: &BudgetPeriod,
        items: &[&BudgetItem],
        window: ForecastWindow,
        generated_at: DateTime<Utc>,
    ) -> BudgetReport {
        let totals = BudgetTotals::of(items.iter().copied());

        BudgetReport {
            id: Uuid::now_v7(),
            period_id: period.id,
            period_name: period.name.clone(),
            generated_at,
            total_budget: totals.total_budget,
            total_actual: totals.total_actual,
            total_committed: totals.total_committed,
            total_available: totals.total_available,
            total_variance: totals.variance(),
            variance_percentage: totals.variance_percentage(),
            variances: Self::variances(items),
            forecasts: Self::forecasts(items, window),
        }
    }

    /// Generates the portfolio analysis.
    #[must_use]
    pub fn generate_analysis(items: &[&BudgetItem], window: ForecastWindow) -> BudgetAnalysis {
        let totals = BudgetTotals::of(items.iter().copied());
        let variance_analysis = Self::variances(items);
        let forecast_analysis = Self::forecasts(items, window);

        let (over_budget_categories, under_budget_categories) = variance_analysis
            .iter()
            .filter(|v| !v.variance_amount.is_zero())
            .cloned()
            .partition(|v| v.variance_amount > Decimal::ZERO);

        let recommendations = Self::recommendations(&variance_analysis, &forecast_analysis);

        BudgetAnalysis {
            total_budget: totals.total_budget,
            total_actual: totals.total_actual,
            total_committed: totals.total_committed,
            total_available: totals.total_available,
            utilization_rate: totals.utilization_rate(),
            variance_analysis,
            forecast_analysis,
            over_budget_categories,
            under_budget_categories,
            recommendations,
        }
    }

    /// At most one message per rule, in rule order.
    #[must_use]
    pub fn recommendations(
        variances: &[BudgetVariance],
        forecasts: &[BudgetForecast],
    ) -> Vec<String> {
        let mut messages = Vec::new();

        let over_budget = variances
            .iter()
            .filter(|v| v.variance_amount > Decimal::ZERO)
            .count();
        if over_budget > 0 {
            messages.push(format!(
                "{} over budget. Review spending controls and approve only essential expenses.",
                categories(over_budget)
            ));
        }

        let projected_overspend = forecasts.iter().filter(|f| f.projected_overspend).count();
        if projected_overspend > 0 {
            messages.push(format!(
                "{} projected to exceed budget by period end. Consider reallocating funds or \
                 deferring discretionary spend.",
                categories(projected_overspend)
            ));
        }

        let high_variance = variances
            .iter()
            .filter(|v| v.variance_percentage.abs() > HIGH_VARIANCE_THRESHOLD)
            .count();
        if high_variance > 0 {
            messages.push(format!(
                "{} with variance above 20%. Revisit the budget assumptions for these categories.",
                categories(high_variance)
            ));
        }

        messages
    }
}

fn categories(count: usize) -> String {
    if count == 1 {
        "1 category".to_string()
    } else {
        format!("{count} categories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::catalog::budget_categories;
    use crate::budget::types::ItemAmounts;
    use chrono::TimeZone;
    use opexa_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn item(budgeted: Decimal, actual: Decimal) -> BudgetItem {
        let category = &budget_categories()[0];
        BudgetItem::new(
            category,
            BudgetPeriodId::new(),
            ItemAmounts {
                budgeted,
                actual,
                committed: Decimal::ZERO,
            },
            Utc::now(),
            UserId::SYSTEM,
        )
    }

    const MID_YEAR: ForecastWindow = ForecastWindow {
        total_days: 360,
        days_remaining: 180,
    };

    #[test]
    fn test_totals_two_items() {
        let a = item(dec!(100), dec!(120));
        let b = item(dec!(200), dec!(150));
        let totals = BudgetTotals::of([&a, &b]);

        assert_eq!(totals.total_budget, dec!(300));
        assert_eq!(totals.total_actual, dec!(270));
        assert_eq!(totals.variance(), dec!(-30));
        assert_eq!(totals.variance_percentage(), dec!(-10));
        assert_eq!(totals.utilization_rate(), dec!(90));
    }

    #[test]
    fn test_empty_totals_guard_division() {
        let totals = BudgetTotals::of(std::iter::empty());

        assert_eq!(totals.variance_percentage(), Decimal::ZERO);
        assert_eq!(totals.utilization_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_analysis_partitions_over_and_under() {
        let over = item(dec!(100), dec!(120));
        let under = item(dec!(200), dec!(150));
        let even = item(dec!(50), dec!(50));
        let analysis = BudgetReportService::generate_analysis(&[&over, &under, &even], MID_YEAR);

        assert_eq!(analysis.over_budget_categories.len(), 1);
        assert_eq!(analysis.over_budget_categories[0].variance_amount, dec!(20));
        assert_eq!(analysis.under_budget_categories.len(), 1);
        assert_eq!(analysis.under_budget_categories[0].variance_amount, dec!(-50));
        assert_eq!(analysis.variance_analysis.len(), 3);
        assert_eq!(analysis.forecast_analysis.len(), 3);
    }

    #[test]
    fn test_no_recommendations_when_on_track() {
        let year_end = ForecastWindow {
            total_days: 365,
            days_remaining: 0,
        };
        let a = item(dec!(1000), dec!(900));
        let analysis = BudgetReportService::generate_analysis(&[&a], year_end);

        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_one_message_per_rule() {
        // Over budget, projected over, and +50% variance.
        let a = item(dec!(100), dec!(150));
        let b = item(dec!(100), dec!(130));
        let analysis = BudgetReportService::generate_analysis(&[&a, &b], MID_YEAR);

        assert_eq!(analysis.recommendations.len(), 3);
        assert!(analysis.recommendations[0].starts_with("2 categories over budget"));
        assert!(analysis.recommendations[1].starts_with("2 categories projected"));
        assert!(analysis.recommendations[2].starts_with("2 categories with variance above 20%"));
    }

    #[test]
    fn test_projection_rule_alone() {
        // 90 of 100 spent after 80 of 100 days projects to 112.5.
        let window = ForecastWindow {
            total_days: 100,
            days_remaining: 20,
        };
        let a = item(dec!(100), dec!(90));
        let analysis = BudgetReportService::generate_analysis(&[&a], window);

        assert_eq!(
            analysis.recommendations,
            vec![
                "1 category projected to exceed budget by period end. Consider reallocating \
                 funds or deferring discretionary spend."
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_variance_exactly_twenty_not_flagged() {
        let a = item(dec!(100), dec!(80));
        let variances = BudgetReportService::variances(&[&a]);

        assert!(BudgetReportService::recommendations(&variances, &[]).is_empty());
    }

    #[test]
    fn test_report_totals() {
        let a = item(dec!(100), dec!(120));
        let b = item(dec!(200), dec!(150));
        let period = BudgetPeriod {
            id: BudgetPeriodId::new(),
            name: "FY2026".to_string(),
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap(),
            is_active: true,
            is_locked: false,
            created_by: UserId::SYSTEM,
            created_at: Utc::now(),
        };
        let report = BudgetReportService::generate_report(&period, &[&a, &b], MID_YEAR, Utc::now());

        assert_eq!(report.total_budget, dec!(300));
        assert_eq!(report.total_actual, dec!(270));
        assert_eq!(report.total_variance, dec!(-30));
        assert_eq!(report.variance_percentage, dec!(-10));
        assert_eq!(report.total_variance, report.total_actual - report.total_budget);
        assert_eq!(report.period_name, "FY2026");
    }
}
