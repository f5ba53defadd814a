//! Operating-expense budget tracking and variance analysis.

pub mod actuals;
pub mod allocation;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod report;
pub mod repository;
pub mod types;
pub mod variance;


pub use actuals::{ActualsSource, LedgerActuals, RandomActuals};
pub use allocation::{AllocationPlan, DepartmentShare};
pub use catalog::budget_categories;
pub use engine::{BudgetAnalysisEngine, MAX_AMOUNT};
pub use error::BudgetError;
pub use forecast::{BudgetForecast, ForecastWindow};
pub use report::{BudgetAnalysis, BudgetReport, BudgetReportService, BudgetTotals};
pub use repository::{
    BudgetRepository, BudgetSnapshot, InMemoryBudgetRepository, JsonFileRepository,
    RepositoryError,
};
pub use types::{
    BudgetAllocation, BudgetCategory, BudgetItem, BudgetItemUpdate, BudgetPeriod, BudgetType,
    ItemAmounts, NewBudgetPeriod, RecordSpendInput, SpendKind,
};
pub use variance::{BudgetVariance, VarianceSeverity, VarianceTrend};
