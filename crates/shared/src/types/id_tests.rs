use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = BudgetItemId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = BudgetPeriodId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_default_is_unique() {
    let a = BudgetItemId::default();
    let b = BudgetItemId::default();
    assert_ne!(a, b);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = BudgetCategoryId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = BudgetAllocationId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(BudgetItemId::from_str("invalid").is_err());
}

#[test]
fn test_system_user_is_nil() {
    assert!(UserId::SYSTEM.into_inner().is_nil());
}
