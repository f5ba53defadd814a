//! The budget analysis engine.
//!
//! Owns the current budget period, the items and allocations of every
//! period it has held, and computes variance, forecast, report and analysis
//! views on demand.
//!
//! Mutations work on a copy of the state which replaces the live state only
//! after validation and persistence succeed, so a rejected call leaves every
//! item untouched.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use opexa_shared::types::{BudgetAllocationId, BudgetItemId, BudgetPeriodId, UserId};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::actuals::ActualsSource;
use super::allocation::{AllocationPlan, split_by_percentages};
use super::catalog::budget_categories;
use super::error::BudgetError;
use super::forecast::{BudgetForecast, ForecastWindow};
use super::report::{BudgetAnalysis, BudgetReport, BudgetReportService};
use super::repository::{BudgetRepository, BudgetSnapshot};
use super::types::{
    BudgetAllocation, BudgetCategory, BudgetItem, BudgetItemUpdate, BudgetPeriod, ItemAmounts,
    NewBudgetPeriod, RecordSpendInput, SpendKind,
};
use super::variance::BudgetVariance;
use crate::clock::Clock;

/// Share of actual spend seeded as committed spend.
const SEED_COMMITTED_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Largest amount any budget, spend or commitment may reach: 10^15.
///
/// Every derived figure (variance %, totals, projections) of amounts within
/// this bound fits in a `Decimal`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Amounts are held to the cent.
const AMOUNT_DP: u32 = 2;

/// Budget analysis engine.
///
/// Construct one per process (or per test) and pass it explicitly to
/// whatever serves it.
pub struct BudgetAnalysisEngine {
    clock: Arc<dyn Clock>,
    actuals: Box<dyn ActualsSource>,
    repository: Option<Arc<dyn BudgetRepository>>,
    plan: AllocationPlan,
    categories: Vec<BudgetCategory>,
    state: Option<BudgetSnapshot>,
}

impl BudgetAnalysisEngine {
    /// Creates an uninitialized engine with no allocation plan and no
    /// repository.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, actuals: Box<dyn ActualsSource>) -> Self {
        Self {
            clock,
            actuals,
            repository: None,
            plan: AllocationPlan::default(),
            categories: budget_categories(),
            state: None,
        }
    }

    /// Persists every state change to `repository`.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn BudgetRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Splits every item seeded from now on across `plan`'s departments.
    #[must_use]
    pub fn with_allocation_plan(mut self, plan: AllocationPlan) -> Self {
        self.plan = plan;
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Seeds a calendar-year period for the clock's current year with one
    /// item per catalog category.
    ///
    /// Replaces any state held before. Actual spend comes from the engine's
    /// [`ActualsSource`]; committed spend is 10% of actual.
    pub fn initialize(&mut self) -> Result<&BudgetPeriod, BudgetError> {
        let now = self.clock.now();
        let (start_date, end_date) = calendar_year(now.year()).ok_or(BudgetError::InvalidPeriod {
            start: now,
            end: now,
        })?;

        let period = BudgetPeriod {
            id: BudgetPeriodId::new(),
            name: format!("FY{}", now.year()),
            start_date,
            end_date,
            is_active: true,
            is_locked: false,
            created_by: UserId::SYSTEM,
            created_at: now,
        };

        let mut items = Vec::with_capacity(self.categories.len());
        let mut allocations = Vec::new();
        for category in &self.categories {
            let actual = self.actuals.actual_for(category);
            ensure_amount("actual", actual)?;

            let item = BudgetItem::new(
                category,
                period.id,
                ItemAmounts {
                    budgeted: category.default_budget,
                    actual,
                    committed: (actual * SEED_COMMITTED_RATIO).round_dp(2),
                },
                now,
                UserId::SYSTEM,
            );
            allocations.extend(allocate(&self.plan, &item));
            items.push(item);
        }

        let snapshot = BudgetSnapshot {
            current_period: period,
            previous_periods: Vec::new(),
            items,
            allocations,
        };
        self.commit(snapshot)?;

        let period = self.current_period().ok_or(BudgetError::NotInitialized)?;
        info!(
            period_id = %period.id,
            period = %period.name,
            categories = self.categories.len(),
            "Budget period initialized"
        );
        Ok(period)
    }

    /// Loads the last saved snapshot from the repository.
    ///
    /// Returns `false` when there is no repository or nothing was saved.
    pub fn restore(&mut self) -> Result<bool, BudgetError> {
        let Some(repository) = &self.repository else {
            return Ok(false);
        };

        match repository.load()? {
            Some(snapshot) => {
                info!(
                    period_id = %snapshot.current_period.id,
                    items = snapshot.items.len(),
                    "Budget snapshot restored"
                );
                self.state = Some(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Makes a new period current and rolls every category forward into it.
    ///
    /// Each category keeps the budget it had in the outgoing period (catalog
    /// default otherwise) and starts with no spend. The outgoing period is
    /// deactivated but kept, along with its items.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod` if `end_date <= start_date`; `PeriodLocked` while the
    /// current period is locked and has not yet ended.
    ///
    /// The new period always becomes the single active period.
    pub fn create_period(&mut self, input: NewBudgetPeriod) -> Result<BudgetPeriod, BudgetError> {
        let now = self.clock.now();

        if input.end_date <= input.start_date {
            let err = BudgetError::InvalidPeriod {
                start: input.start_date,
                end: input.end_date,
            };
            warn!(error = %err, "Budget period rejected");
            return Err(err);
        }

        if let Some(current) = self.current_period()
            && current.is_locked
            && now <= current.end_date
        {
            warn!(period_id = %current.id, "Cannot supersede a locked period before it ends");
            return Err(BudgetError::PeriodLocked);
        }

        let period = BudgetPeriod {
            id: BudgetPeriodId::new(),
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: true,
            is_locked: input.is_locked,
            created_by: input.created_by,
            created_at: now,
        };

        let mut next = match &self.state {
            Some(state) => {
                let mut next = state.clone();
                let mut outgoing = std::mem::replace(&mut next.current_period, period.clone());
                outgoing.is_active = false;
                next.previous_periods.push(outgoing);
                next
            }
            None => BudgetSnapshot {
                current_period: period.clone(),
                previous_periods: Vec::new(),
                items: Vec::new(),
                allocations: Vec::new(),
            },
        };

        let outgoing_id = next.previous_periods.last().map(|p| p.id);
        for category in &self.categories {
            let budgeted = outgoing_id
                .and_then(|id| {
                    next.items
                        .iter()
                        .find(|i| i.period_id == id && i.category_id == category.id)
                })
                .map_or(category.default_budget, |i| i.budgeted_amount);

            let item = BudgetItem::new(
                category,
                period.id,
                ItemAmounts {
                    budgeted,
                    ..ItemAmounts::default()
                },
                now,
                input.created_by,
            );
            next.allocations.extend(allocate(&self.plan, &item));
            next.items.push(item);
        }

        self.commit(next)?;

        info!(
            period_id = %period.id,
            period = %period.name,
            created_by = %period.created_by,
            "Budget period created"
        );
        Ok(period)
    }

    /// Freezes the current period against item mutation.
    pub fn lock_period(&mut self, by: UserId) -> Result<BudgetPeriod, BudgetError> {
        self.set_locked(true, by)
    }

    /// Lifts an administrative freeze on the current period.
    pub fn unlock_period(&mut self, by: UserId) -> Result<BudgetPeriod, BudgetError> {
        self.set_locked(false, by)
    }

    fn set_locked(&mut self, locked: bool, by: UserId) -> Result<BudgetPeriod, BudgetError> {
        let mut next = self.state.clone().ok_or(BudgetError::NotInitialized)?;
        next.current_period.is_locked = locked;
        let period = next.current_period.clone();
        self.commit(next)?;

        info!(period_id = %period.id, locked, by = %by, "Budget period lock changed");
        Ok(period)
    }

    // ========================================================================
    // Item mutation
    // ========================================================================

    /// Overwrites the given amounts of one item and recomputes its derived
    /// fields and allocations.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, `InvalidAmount` for an amount that is negative, above
    /// [`MAX_AMOUNT`] or finer than a cent, `PeriodLocked`
    /// if the item's period is locked, `VersionConflict` if
    /// `expected_version` is stale. No item changes on error.
    pub fn update_item(
        &mut self,
        id: BudgetItemId,
        update: BudgetItemUpdate,
    ) -> Result<BudgetItem, BudgetError> {
        self.mutate_item(id, update.expected_version, update.updated_by, |item, allocations| {
            if let Some(amount) = update.budgeted_amount {
                ensure_amount("budgeted", amount)?;
            }
            if let Some(amount) = update.actual_amount {
                ensure_amount("actual", amount)?;
            }
            if let Some(amount) = update.committed_amount {
                ensure_amount("committed", amount)?;
            }

            if let Some(amount) = update.budgeted_amount {
                item.budgeted_amount = amount;
                respread(allocations, amount, |a, share| a.allocated_amount = share);
            }
            if let Some(amount) = update.actual_amount {
                item.actual_amount = amount;
                respread(allocations, amount, |a, share| a.used_amount = share);
            }
            if let Some(amount) = update.committed_amount {
                item.committed_amount = amount;
            }
            Ok(())
        })
    }

    /// Adds spend to one item.
    ///
    /// Actual spend for a department is charged to that department's
    /// allocation; without a department it is spread by percentage.
    ///
    /// # Errors
    ///
    /// As [`Self::update_item`], plus `InvalidAmount` for a non-positive
    /// amount and `DepartmentNotFound` for an unknown department.
    pub fn record_spend(
        &mut self,
        id: BudgetItemId,
        input: RecordSpendInput,
    ) -> Result<BudgetItem, BudgetError> {
        self.mutate_item(id, input.expected_version, input.recorded_by, |item, allocations| {
            if input.amount <= Decimal::ZERO {
                return Err(BudgetError::InvalidAmount {
                    field: "spend",
                    amount: input.amount,
                });
            }
            ensure_amount("spend", input.amount)?;

            let department = match &input.department {
                Some(name) => Some(
                    allocations
                        .iter()
                        .position(|a| a.department == *name)
                        .ok_or_else(|| BudgetError::DepartmentNotFound(name.clone()))?,
                ),
                None => None,
            };

            match input.kind {
                SpendKind::Commitment => {
                    item.committed_amount += input.amount;
                    ensure_amount("committed", item.committed_amount)?;
                }
                SpendKind::Actual => {
                    item.actual_amount += input.amount;
                    ensure_amount("actual", item.actual_amount)?;
                    match department {
                        Some(idx) => allocations[idx].used_amount += input.amount,
                        None => {
                            let percentages: Vec<Decimal> =
                                allocations.iter().map(|a| a.percentage).collect();
                            let shares = split_by_percentages(input.amount, &percentages);
                            for (allocation, share) in allocations.iter_mut().zip(shares) {
                                allocation.used_amount += share;
                            }
                        }
                    }
                }
            }
            Ok(())
        })
    }

    /// Runs `apply` against a copy of one item and its allocations, then
    /// recomputes, stamps and commits.
    fn mutate_item<F>(
        &mut self,
        id: BudgetItemId,
        expected_version: Option<u64>,
        by: UserId,
        apply: F,
    ) -> Result<BudgetItem, BudgetError>
    where
        F: FnOnce(&mut BudgetItem, &mut [&mut BudgetAllocation]) -> Result<(), BudgetError>,
    {
        let now = self.clock.now();
        let result = self.prepare_mutation(id, expected_version, by, now, apply);

        match result {
            Ok((next, updated)) => {
                self.commit(next)?;
                debug!(
                    item_id = %updated.id,
                    version = updated.version,
                    available = %updated.available_amount,
                    over_budget = updated.is_over_budget,
                    "Budget item recomputed"
                );
                Ok(updated)
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "Budget item mutation rejected");
                Err(e)
            }
        }
    }

    fn prepare_mutation<F>(
        &self,
        id: BudgetItemId,
        expected_version: Option<u64>,
        by: UserId,
        now: DateTime<Utc>,
        apply: F,
    ) -> Result<(BudgetSnapshot, BudgetItem), BudgetError>
    where
        F: FnOnce(&mut BudgetItem, &mut [&mut BudgetAllocation]) -> Result<(), BudgetError>,
    {
        let state = self.state.as_ref().ok_or(BudgetError::NotInitialized)?;
        let current = state
            .items
            .iter()
            .find(|i| i.id == id)
            .ok_or(BudgetError::ItemNotFound(id))?;

        if state.period(current.period_id).is_some_and(|p| p.is_locked) {
            return Err(BudgetError::PeriodLocked);
        }
        if let Some(expected) = expected_version
            && expected != current.version
        {
            return Err(BudgetError::VersionConflict {
                expected,
                actual: current.version,
            });
        }

        let mut next = state.clone();
        let BudgetSnapshot {
            items, allocations, ..
        } = &mut next;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BudgetError::ItemNotFound(id))?;
        let mut item_allocations: Vec<&mut BudgetAllocation> = allocations
            .iter_mut()
            .filter(|a| a.item_id == id)
            .collect();

        apply(&mut *item, &mut item_allocations)?;

        for allocation in &mut item_allocations {
            allocation.recompute();
        }
        item.recompute();
        item.touch(now, by);

        let updated = item.clone();
        Ok((next, updated))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns true once a period has been seeded, created or restored.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// The current period.
    #[must_use]
    pub fn current_period(&self) -> Option<&BudgetPeriod> {
        self.state.as_ref().map(|s| &s.current_period)
    }

    /// The static category catalog.
    #[must_use]
    pub fn budget_categories(&self) -> &[BudgetCategory] {
        &self.categories
    }

    /// Items of every period, or of `period_id` only.
    #[must_use]
    pub fn budget_items(&self, period_id: Option<BudgetPeriodId>) -> Vec<&BudgetItem> {
        self.state.as_ref().map_or_else(Vec::new, |s| {
            s.items
                .iter()
                .filter(|i| period_id.is_none_or(|p| i.period_id == p))
                .collect()
        })
    }

    /// One item by ID.
    #[must_use]
    pub fn budget_item(&self, id: BudgetItemId) -> Option<&BudgetItem> {
        self.state.as_ref()?.items.iter().find(|i| i.id == id)
    }

    /// Departmental allocations of one item.
    pub fn allocations(&self, item_id: BudgetItemId) -> Result<Vec<&BudgetAllocation>, BudgetError> {
        let state = self.state.as_ref().ok_or(BudgetError::NotInitialized)?;
        if !state.items.iter().any(|i| i.id == item_id) {
            return Err(BudgetError::ItemNotFound(item_id));
        }
        Ok(state
            .allocations
            .iter()
            .filter(|a| a.item_id == item_id)
            .collect())
    }

    /// Variance of every current-period item. Empty before initialization.
    #[must_use]
    pub fn variance_analysis(&self) -> Vec<BudgetVariance> {
        BudgetReportService::variances(&self.current_items())
    }

    /// Forecast of every current-period item. Empty before initialization.
    #[must_use]
    pub fn forecast_analysis(&self) -> Vec<BudgetForecast> {
        self.forecast_window().map_or_else(Vec::new, |window| {
            BudgetReportService::forecasts(&self.current_items(), window)
        })
    }

    /// Report on the current period.
    pub fn create_report(&self) -> Result<BudgetReport, BudgetError> {
        let period = self.current_period().ok_or(BudgetError::NotInitialized)?;
        let window = ForecastWindow::for_period(period, self.clock.now());
        Ok(BudgetReportService::generate_report(
            period,
            &self.current_items(),
            window,
            self.clock.now(),
        ))
    }

    /// Portfolio analysis of the current period.
    pub fn analysis(&self) -> Result<BudgetAnalysis, BudgetError> {
        let window = self.forecast_window().ok_or(BudgetError::NotInitialized)?;
        Ok(BudgetReportService::generate_analysis(
            &self.current_items(),
            window,
        ))
    }

    fn forecast_window(&self) -> Option<ForecastWindow> {
        self.current_period()
            .map(|period| ForecastWindow::for_period(period, self.clock.now()))
    }

    fn current_items(&self) -> Vec<&BudgetItem> {
        self.state.as_ref().map_or_else(Vec::new, |s| {
            s.items
                .iter()
                .filter(|i| i.period_id == s.current_period.id)
                .collect()
        })
    }

    /// Saves `next` and makes it the live state.
    fn commit(&mut self, next: BudgetSnapshot) -> Result<(), BudgetError> {
        if let Some(repository) = &self.repository {
            repository
                .save(&next)
                .inspect_err(|e| warn!(error = %e, "Failed to save budget snapshot"))?;
        }
        self.state = Some(next);
        Ok(())
    }
}

impl BudgetSnapshot {
    /// Finds a period held in this snapshot.
    #[must_use]
    pub fn period(&self, id: BudgetPeriodId) -> Option<&BudgetPeriod> {
        std::iter::once(&self.current_period)
            .chain(&self.previous_periods)
            .find(|p| p.id == id)
    }
}

/// Accepts amounts from 0 to [`MAX_AMOUNT`] with at most two decimal places.
fn ensure_amount(field: &'static str, amount: Decimal) -> Result<(), BudgetError> {
    if amount < Decimal::ZERO || amount > MAX_AMOUNT || amount.round_dp(AMOUNT_DP) != amount {
        return Err(BudgetError::InvalidAmount { field, amount });
    }
    Ok(())
}

/// Jan 1 00:00:00 through Dec 31 23:59:59 UTC.
fn calendar_year(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?.and_hms_opt(23, 59, 59)?;
    Some((start.and_utc(), end.and_utc()))
}

/// Builds `item`'s allocations: budget and actual split by the plan.
fn allocate(plan: &AllocationPlan, item: &BudgetItem) -> Vec<BudgetAllocation> {
    let allocated = plan.split(item.budgeted_amount);
    let used = plan.split(item.actual_amount);

    plan.shares()
        .iter()
        .zip(allocated.into_iter().zip(used))
        .map(|(share, (allocated_amount, used_amount))| {
            let mut allocation = BudgetAllocation {
                id: BudgetAllocationId::new(),
                item_id: item.id,
                department: share.department.clone(),
                percentage: share.percentage,
                allocated_amount,
                used_amount,
                remaining_amount: Decimal::ZERO,
            };
            allocation.recompute();
            allocation
        })
        .collect()
}

/// Re-splits `total` over `allocations` by their percentages.
fn respread(
    allocations: &mut [&mut BudgetAllocation],
    total: Decimal,
    set: impl Fn(&mut BudgetAllocation, Decimal),
) {
    let percentages: Vec<Decimal> = allocations.iter().map(|a| a.percentage).collect();
    let shares = split_by_percentages(total, &percentages);
    for (allocation, share) in allocations.iter_mut().zip(shares) {
        set(allocation, share);
    }
}
