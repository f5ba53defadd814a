//! Operating-expense category catalog.
//!
//! Reference data seeded once. IDs are derived from the catalog position so
//! they stay stable across restarts and snapshot reloads.

use opexa_shared::types::BudgetCategoryId;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{BudgetCategory, BudgetType};

/// High bits shared by every catalog category ID.
const CATEGORY_ID_BASE: u128 = 0x0b0d_9e7c_a7e6_4000_8000_0000_0000_0000;

struct CatalogEntry {
    code: &'static str,
    name: &'static str,
    description: &'static str,
    budget_type: BudgetType,
    default_budget: i64,
}

const CATALOG: [CatalogEntry; 15] = [
    CatalogEntry {
        code: "OPEX-001",
        name: "Salaries and Benefits",
        description: "Staff salaries, allowances, pension and medical cover",
        budget_type: BudgetType::Operating,
        default_budget: 850_000,
    },
    CatalogEntry {
        code: "OPEX-002",
        name: "Rent and Utilities",
        description: "Branch and head office rent, electricity and water",
        budget_type: BudgetType::Operating,
        default_budget: 180_000,
    },
    CatalogEntry {
        code: "OPEX-003",
        name: "Office Supplies and Stationery",
        description: "Consumables, printing and loan forms",
        budget_type: BudgetType::Operating,
        default_budget: 45_000,
    },
    CatalogEntry {
        code: "OPEX-004",
        name: "Travel and Transport",
        description: "Field officer motorcycles, fuel and staff travel",
        budget_type: BudgetType::Operating,
        default_budget: 120_000,
    },
    CatalogEntry {
        code: "OPEX-005",
        name: "Communication and Internet",
        description: "Airtime, SMS notifications and connectivity",
        budget_type: BudgetType::Operating,
        default_budget: 60_000,
    },
    CatalogEntry {
        code: "OPEX-006",
        name: "Staff Training and Development",
        description: "Credit officer training and workshops",
        budget_type: BudgetType::Operating,
        default_budget: 75_000,
    },
    CatalogEntry {
        code: "OPEX-007",
        name: "Professional and Audit Fees",
        description: "External audit, legal and consultancy",
        budget_type: BudgetType::Operating,
        default_budget: 90_000,
    },
    CatalogEntry {
        code: "OPEX-008",
        name: "Insurance",
        description: "Asset, cash-in-transit and fidelity cover",
        budget_type: BudgetType::Operating,
        default_budget: 55_000,
    },
    CatalogEntry {
        code: "OPEX-009",
        name: "Marketing and Client Outreach",
        description: "Group meetings, promotions and client education",
        budget_type: BudgetType::Operating,
        default_budget: 70_000,
    },
    CatalogEntry {
        code: "OPEX-010",
        name: "IT Systems and Software",
        description: "Core banking licences, hardware and support",
        budget_type: BudgetType::Operating,
        default_budget: 110_000,
    },
    CatalogEntry {
        code: "OPEX-011",
        name: "Repairs and Maintenance",
        description: "Premises, furniture and vehicle upkeep",
        budget_type: BudgetType::Operating,
        default_budget: 40_000,
    },
    CatalogEntry {
        code: "OPEX-012",
        name: "Depreciation",
        description: "Depreciation of fixed assets",
        budget_type: BudgetType::Operating,
        default_budget: 95_000,
    },
    CatalogEntry {
        code: "OPEX-013",
        name: "Bank Charges",
        description: "Transfer, mobile money and account fees",
        budget_type: BudgetType::Operating,
        default_budget: 25_000,
    },
    CatalogEntry {
        code: "INT-001",
        name: "Interest on Borrowings",
        description: "Interest on lines of credit funding the loan book",
        budget_type: BudgetType::Interest,
        default_budget: 300_000,
    },
    CatalogEntry {
        code: "TAX-001",
        name: "Taxes and Licenses",
        description: "Business permits, regulatory levies and withholding tax",
        budget_type: BudgetType::Tax,
        default_budget: 65_000,
    },
];

/// Returns the stable ID of the catalog entry at `index`.
fn category_id(index: usize) -> BudgetCategoryId {
    BudgetCategoryId::from_uuid(Uuid::from_u128(CATEGORY_ID_BASE + index as u128 + 1))
}

/// Builds the full category catalog in display order.
#[must_use]
pub fn budget_categories() -> Vec<BudgetCategory> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(index, entry)| BudgetCategory {
            id: category_id(index),
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            code: entry.code.to_string(),
            budget_type: entry.budget_type,
            parent_id: None,
            default_budget: Decimal::from(entry.default_budget),
        })
        .collect()
}
