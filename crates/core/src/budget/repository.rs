//! Snapshot persistence for the budget engine.
//!
//! The engine keeps its state in memory and hands a full snapshot to a
//! [`BudgetRepository`] after every mutation. Storage choice is left to the
//! integrator.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{BudgetAllocation, BudgetItem, BudgetPeriod};

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// File could not be read or written.
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// File contents are not a valid snapshot.
    #[error("Snapshot is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A previous holder of the in-memory snapshot panicked.
    #[error("Snapshot lock poisoned")]
    Poisoned,
}

/// Everything the engine needs to resume after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Current period.
    pub current_period: BudgetPeriod,
    /// Earlier periods, oldest first.
    #[serde(default)]
    pub previous_periods: Vec<BudgetPeriod>,
    /// Items of every period.
    pub items: Vec<BudgetItem>,
    /// Allocations of every item.
    pub allocations: Vec<BudgetAllocation>,
}

/// Durable store for the engine snapshot.
pub trait BudgetRepository: Send + Sync {
    /// Returns the last saved snapshot, if any.
    fn load(&self) -> Result<Option<BudgetSnapshot>, RepositoryError>;

    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &BudgetSnapshot) -> Result<(), RepositoryError>;
}

/// Process-local repository. Useful for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct InMemoryBudgetRepository {
    snapshot: Mutex<Option<BudgetSnapshot>>,
}

impl InMemoryBudgetRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetRepository for InMemoryBudgetRepository {
    fn load(&self) -> Result<Option<BudgetSnapshot>, RepositoryError> {
        let guard = self.snapshot.lock().map_err(|_| RepositoryError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &BudgetSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.snapshot.lock().map_err(|_| RepositoryError::Poisoned)?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}

/// Stores the snapshot as pretty-printed JSON in a single file.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Creates a repository backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BudgetRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<BudgetSnapshot>, RepositoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &BudgetSnapshot) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::catalog::budget_categories;
    use crate::budget::types::ItemAmounts;
    use chrono::{TimeZone, Utc};
    use opexa_shared::types::{BudgetPeriodId, UserId};
    use rust_decimal_macros::dec;

    fn snapshot() -> BudgetSnapshot {
        let period = BudgetPeriod {
            id: BudgetPeriodId::new(),
            name: "FY2026".to_string(),
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap(),
            is_active: true,
            is_locked: false,
            created_by: UserId::SYSTEM,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let item = BudgetItem::new(
            &budget_categories()[0],
            period.id,
            ItemAmounts {
                budgeted: dec!(850000),
                actual: dec!(412345.67),
                committed: dec!(41234.57),
            },
            period.created_at,
            UserId::SYSTEM,
        );
        BudgetSnapshot {
            current_period: period,
            previous_periods: vec![],
            items: vec![item],
            allocations: vec![],
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("opexa-repo-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_in_memory_starts_empty() {
        let repo = InMemoryBudgetRepository::new();
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_in_memory_save_load() {
        let repo = InMemoryBudgetRepository::new();
        let snapshot = snapshot();
        repo.save(&snapshot).unwrap();

        assert_eq!(repo.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_json_missing_file_is_none() {
        let repo = JsonFileRepository::new(scratch_path("budget.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_json_save_load_preserves_amounts() {
        let path = scratch_path("budget.json");
        let repo = JsonFileRepository::new(&path);
        let snapshot = snapshot();
        repo.save(&snapshot).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.items[0].actual_amount, dec!(412345.67));
        assert!(!repo.temp_path().exists());

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_json_malformed_file() {
        let path = scratch_path("budget.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(matches!(repo.load(), Err(RepositoryError::Serialization(_))));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
