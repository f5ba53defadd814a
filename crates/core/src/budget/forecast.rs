//! Year-end spend forecasts from a linear burn rate.

use chrono::{DateTime, TimeDelta, Utc};
use opexa_shared::types::BudgetCategoryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{BudgetItem, BudgetPeriod};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Decimal places of reported forecast amounts.
const FORECAST_DP: u32 = 2;

/// Whole days in `span`, rounded up. Non-positive spans are 0 days.
#[must_use]
pub fn ceil_days(span: TimeDelta) -> i64 {
    let millis = span.num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

/// Elapsed and remaining days of a period at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    /// Length of the period in days.
    pub total_days: i64,
    /// Days from now until the period ends, within `0..=total_days`.
    pub days_remaining: i64,
}

impl ForecastWindow {
    /// Measures `period` as seen at `now`.
    #[must_use]
    pub fn for_period(period: &BudgetPeriod, now: DateTime<Utc>) -> Self {
        let total_days = ceil_days(period.end_date - period.start_date);
        let days_remaining = ceil_days(period.end_date - now).min(total_days);
        Self {
            total_days,
            days_remaining,
        }
    }

    /// Days already spent.
    #[must_use]
    pub const fn days_elapsed(&self) -> i64 {
        self.total_days - self.days_remaining
    }

    /// Average daily spend so far.
    ///
    /// Returns `0` on the first day of the period, when no day has elapsed
    /// to average over.
    #[must_use]
    pub fn burn_rate(&self, actual: Decimal) -> Decimal {
        match self.days_elapsed() {
            0 => Decimal::ZERO,
            elapsed => actual / Decimal::from(elapsed),
        }
    }

    /// `actual` extrapolated linearly to the end of the period.
    #[must_use]
    pub fn project(&self, actual: Decimal) -> Decimal {
        match self.days_elapsed() {
            0 => actual,
            elapsed => {
                actual + actual * Decimal::from(self.days_remaining) / Decimal::from(elapsed)
            }
        }
    }
}

/// Projected year-end spend of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetForecast {
    /// Category ID.
    pub category_id: BudgetCategoryId,
    /// Category name.
    pub category_name: String,
    /// Spend to date.
    pub current_spend: Decimal,
    /// Average daily spend to date.
    pub burn_rate: Decimal,
    /// Days left in the period.
    pub days_remaining: i64,
    /// Spend expected by period end at the current burn rate.
    pub projected_spend: Decimal,
    /// budgeted - actual.
    pub budget_remaining: Decimal,
    /// projected_spend > budgeted.
    pub projected_overspend: bool,
}

impl BudgetForecast {
    /// Forecasts an item over `window`.
    #[must_use]
    pub fn for_item(item: &BudgetItem, window: ForecastWindow) -> Self {
        let projected_spend = window.project(item.actual_amount).round_dp(FORECAST_DP);

        Self {
            category_id: item.category_id,
            category_name: item.category_name.clone(),
            current_spend: item.actual_amount,
            burn_rate: window.burn_rate(item.actual_amount).round_dp(FORECAST_DP),
            days_remaining: window.days_remaining,
            projected_spend,
            budget_remaining: item.budgeted_amount - item.actual_amount,
            projected_overspend: projected_spend > item.budgeted_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use opexa_shared::types::{BudgetPeriodId, UserId};
    use rust_decimal_macros::dec;

    fn calendar_year(year: i32) -> BudgetPeriod {
        BudgetPeriod {
            id: BudgetPeriodId::new(),
            name: format!("FY{year}"),
            start_date: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).unwrap(),
            is_active: true,
            is_locked: false,
            created_by: UserId::SYSTEM,
            created_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_ceil_days() {
        assert_eq!(ceil_days(TimeDelta::zero()), 0);
        assert_eq!(ceil_days(TimeDelta::seconds(-5)), 0);
        assert_eq!(ceil_days(TimeDelta::milliseconds(1)), 1);
        assert_eq!(ceil_days(TimeDelta::days(2)), 2);
        assert_eq!(ceil_days(TimeDelta::days(2) + TimeDelta::hours(1)), 3);
    }

    #[test]
    fn test_calendar_year_lengths() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ForecastWindow::for_period(&calendar_year(2026), now).total_days, 365);

        let now = Utc.with_ymd_and_hms(2028, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ForecastWindow::for_period(&calendar_year(2028), now).total_days, 366);
    }

    #[test]
    fn test_first_instant_has_zero_burn_rate() {
        let period = calendar_year(2026);
        let window = ForecastWindow::for_period(&period, period.start_date);

        assert_eq!(window.days_remaining, 365);
        assert_eq!(window.days_elapsed(), 0);
        assert_eq!(window.burn_rate(dec!(1000)), Decimal::ZERO);
        assert_eq!(window.project(dec!(1000)), dec!(1000));
    }

    #[test]
    fn test_remaining_clamped_before_and_after_period() {
        let period = calendar_year(2026);

        let before = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(ForecastWindow::for_period(&period, before).days_remaining, 365);

        let after = Utc.with_ymd_and_hms(2027, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(ForecastWindow::for_period(&period, after).days_remaining, 0);
    }

    #[test]
    fn test_full_year_elapsed_projects_actual() {
        let window = ForecastWindow {
            total_days: 365,
            days_remaining: 0,
        };

        assert_eq!(window.burn_rate(dec!(36500)), dec!(100));
        assert_eq!(window.project(dec!(36500)), dec!(36500));
    }

    #[test]
    fn test_half_year_doubles_spend() {
        let window = ForecastWindow {
            total_days: 360,
            days_remaining: 180,
        };

        assert_eq!(window.burn_rate(dec!(18000)), dec!(100));
        assert_eq!(window.project(dec!(18000)), dec!(36000));
    }
}
