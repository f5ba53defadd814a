//! Budget data types.

use chrono::{DateTime, Utc};
use opexa_shared::types::{
    BudgetAllocationId, BudgetCategoryId, BudgetItemId, BudgetPeriodId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::variance::percentage_of;

/// Budget type classification of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    /// Day-to-day operating expense.
    Operating,
    /// Interest paid on borrowings.
    Interest,
    /// Taxes and statutory levies.
    Tax,
}

/// A budget period (one fiscal cycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPeriod {
    /// Period ID.
    pub id: BudgetPeriodId,
    /// Display name (e.g., "FY2026").
    pub name: String,
    /// First instant of the period.
    pub start_date: DateTime<Utc>,
    /// Last instant of the period.
    pub end_date: DateTime<Utc>,
    /// Whether this is the current period.
    pub is_active: bool,
    /// Whether the period is frozen against mutation.
    pub is_locked: bool,
    /// User who created the period.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BudgetPeriod {
    /// Returns true if `instant` falls within this period.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_date && instant <= self.end_date
    }
}

/// A static expense category from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCategory {
    /// Category ID.
    pub id: BudgetCategoryId,
    /// Category name.
    pub name: String,
    /// Category description.
    pub description: String,
    /// Chart-of-accounts style code (e.g., "OPEX-001").
    pub code: String,
    /// Budget type.
    pub budget_type: BudgetType,
    /// Parent category, if any.
    pub parent_id: Option<BudgetCategoryId>,
    /// Annual budget assigned when a period is seeded.
    pub default_budget: Decimal,
}

/// Budget vs actual record for one category within one period.
///
/// `available_amount`, `variance_amount`, `variance_percentage` and
/// `is_over_budget` are derived. They are only written by
/// [`BudgetItem::recompute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// Item ID.
    pub id: BudgetItemId,
    /// Category ID.
    pub category_id: BudgetCategoryId,
    /// Category name.
    pub category_name: String,
    /// Owning period ID.
    pub period_id: BudgetPeriodId,
    /// Budgeted amount.
    pub budgeted_amount: Decimal,
    /// Accumulated spend.
    pub actual_amount: Decimal,
    /// Encumbered spend not yet paid.
    pub committed_amount: Decimal,
    /// budgeted - actual - committed. May be negative.
    pub available_amount: Decimal,
    /// actual - budgeted. Positive means overspend.
    pub variance_amount: Decimal,
    /// variance / budgeted * 100, or 0 when nothing is budgeted.
    pub variance_percentage: Decimal,
    /// actual > budgeted.
    pub is_over_budget: bool,
    /// Last mutation timestamp.
    pub last_updated: DateTime<Utc>,
    /// Last mutation author.
    pub last_updated_by: UserId,
    /// Optimistic-concurrency stamp, bumped on every mutation.
    pub version: u64,
}

impl BudgetItem {
    /// Creates an item for `category` under `period_id` with derived fields
    /// already computed.
    #[must_use]
    pub fn new(
        category: &BudgetCategory,
        period_id: BudgetPeriodId,
        amounts: ItemAmounts,
        now: DateTime<Utc>,
        by: UserId,
    ) -> Self {
        let mut item = Self {
            id: BudgetItemId::new(),
            category_id: category.id,
            category_name: category.name.clone(),
            period_id,
            budgeted_amount: amounts.budgeted,
            actual_amount: amounts.actual,
            committed_amount: amounts.committed,
            available_amount: Decimal::ZERO,
            variance_amount: Decimal::ZERO,
            variance_percentage: Decimal::ZERO,
            is_over_budget: false,
            last_updated: now,
            last_updated_by: by,
            version: 1,
        };
        item.recompute();
        item
    }

    /// Recomputes every derived field from budgeted, actual and committed.
    pub fn recompute(&mut self) {
        self.available_amount = self.budgeted_amount - self.actual_amount - self.committed_amount;
        self.variance_amount = self.actual_amount - self.budgeted_amount;
        self.variance_percentage = percentage_of(self.variance_amount, self.budgeted_amount);
        self.is_over_budget = self.actual_amount > self.budgeted_amount;
    }

    /// Stamps a mutation.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>, by: UserId) {
        self.last_updated = now;
        self.last_updated_by = by;
        self.version += 1;
    }
}

/// The three input amounts of a budget item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemAmounts {
    /// Budgeted amount.
    pub budgeted: Decimal,
    /// Actual spend.
    pub actual: Decimal,
    /// Committed spend.
    pub committed: Decimal,
}

/// A department's slice of one budget item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Allocation ID.
    pub id: BudgetAllocationId,
    /// Parent item ID.
    pub item_id: BudgetItemId,
    /// Department name.
    pub department: String,
    /// Share of the item budget, in percent.
    pub percentage: Decimal,
    /// Budget allocated to the department.
    pub allocated_amount: Decimal,
    /// Spend recorded against the department.
    pub used_amount: Decimal,
    /// allocated - used.
    pub remaining_amount: Decimal,
}

impl BudgetAllocation {
    pub(crate) fn recompute(&mut self) {
        self.remaining_amount = self.allocated_amount - self.used_amount;
    }
}

/// Fields for creating a new budget period.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudgetPeriod {
    /// Display name.
    pub name: String,
    /// First instant of the period.
    pub start_date: DateTime<Utc>,
    /// Last instant of the period.
    pub end_date: DateTime<Utc>,
    /// Ignored by the engine: the created period always becomes the active one.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the period starts locked.
    #[serde(default)]
    pub is_locked: bool,
    /// User creating the period.
    pub created_by: UserId,
}

const fn default_true() -> bool {
    true
}

/// Partial overwrite of a budget item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetItemUpdate {
    /// New budgeted amount.
    #[serde(default)]
    pub budgeted_amount: Option<Decimal>,
    /// New actual amount.
    #[serde(default)]
    pub actual_amount: Option<Decimal>,
    /// New committed amount.
    #[serde(default)]
    pub committed_amount: Option<Decimal>,
    /// User making the change.
    pub updated_by: UserId,
    /// Version the caller last read. Rejected if stale.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// What a recorded spend adds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendKind {
    /// Paid spend; increases `actual_amount`.
    #[default]
    Actual,
    /// Encumbered spend; increases `committed_amount`.
    Commitment,
}

/// A spend entry against one budget item.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSpendInput {
    /// Amount to add. Must be positive.
    pub amount: Decimal,
    /// Actual or committed spend.
    #[serde(default)]
    pub kind: SpendKind,
    /// Department the spend belongs to. Spread by percentage when absent.
    #[serde(default)]
    pub department: Option<String>,
    /// User recording the spend.
    pub recorded_by: UserId,
    /// Version the caller last read. Rejected if stale.
    #[serde(default)]
    pub expected_version: Option<u64>,
}
