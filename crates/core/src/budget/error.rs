//! Budget error types.

use chrono::{DateTime, Utc};
use opexa_shared::{AppError, types::BudgetItemId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::repository::RepositoryError;

/// Budget-related errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// No period has been initialized or restored yet.
    #[error("Budget has not been initialized")]
    NotInitialized,

    /// Budget item not found.
    #[error("Budget item not found: {0}")]
    ItemNotFound(BudgetItemId),

    /// Amount is negative (or, for recorded spend, not positive), exceeds
    /// the engine maximum, or is finer than a cent.
    #[error("Invalid {field} amount: {amount}")]
    InvalidAmount {
        /// Which amount was rejected.
        field: &'static str,
        /// The rejected value.
        amount: Decimal,
    },

    /// Period end is not after its start.
    #[error("Invalid period: end {end} is not after start {start}")]
    InvalidPeriod {
        /// Start instant.
        start: DateTime<Utc>,
        /// End instant.
        end: DateTime<Utc>,
    },

    /// Period is locked and cannot be modified.
    #[error("Budget period is locked and cannot be modified")]
    PeriodLocked,

    /// Caller's view of the item is stale.
    #[error("Version conflict: expected {expected}, item is at {actual}")]
    VersionConflict {
        /// Version supplied by the caller.
        expected: u64,
        /// Current version of the item.
        actual: u64,
    },

    /// Item has no allocation for the department.
    #[error("Department not found: {0}")]
    DepartmentNotFound(String),

    /// Department percentages do not add up to 100.
    #[error("Allocation percentages must sum to 100, got {0}")]
    InvalidAllocationPlan(Decimal),

    /// Snapshot could not be loaded or saved.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::ItemNotFound(_) | BudgetError::DepartmentNotFound(_) => {
                Self::NotFound(message)
            }
            BudgetError::InvalidAmount { .. }
            | BudgetError::InvalidPeriod { .. }
            | BudgetError::InvalidAllocationPlan(_) => Self::Validation(message),
            BudgetError::NotInitialized => Self::BusinessRule(message),
            BudgetError::PeriodLocked | BudgetError::VersionConflict { .. } => {
                Self::Conflict(message)
            }
            BudgetError::Repository(_) => Self::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_maps_to_app_error_status() {
        let cases = [
            (BudgetError::ItemNotFound(BudgetItemId::new()), 404),
            (BudgetError::DepartmentNotFound("Audit".into()), 404),
            (
                BudgetError::InvalidAmount {
                    field: "actual",
                    amount: dec!(-1),
                },
                400,
            ),
            (BudgetError::InvalidAllocationPlan(dec!(90)), 400),
            (BudgetError::NotInitialized, 422),
            (BudgetError::PeriodLocked, 409),
            (
                BudgetError::VersionConflict {
                    expected: 1,
                    actual: 2,
                },
                409,
            ),
        ];

        for (err, status) in cases {
            let label = err.to_string();
            assert_eq!(AppError::from(err).status_code(), status, "{label}");
        }
    }

    #[test]
    fn test_display() {
        let err = BudgetError::InvalidAmount {
            field: "budgeted",
            amount: dec!(-5),
        };
        assert_eq!(err.to_string(), "Invalid budgeted amount: -5");
    }
}
