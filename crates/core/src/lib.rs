//! Core business logic for Opexa.
//!
//! This crate contains pure business logic with ZERO web dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `budget` - Operating-expense budget periods, items, allocations,
//!   variance and forecast analysis, reports and recommendations
//! - `clock` - Time source used by the engine

pub mod budget;
pub mod clock;

pub use budget::{BudgetAnalysisEngine, BudgetError};
pub use clock::{Clock, FixedClock, SystemClock};
