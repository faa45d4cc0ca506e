// 💸 Expense Entity - One recorded expense with stable identity
//
// "The UUID is IDENTITY, everything else is a VALUE frozen at creation"
//
// Equality and hashing go through the id only: two items with the same
// values but different ids are different expenses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// EXPENSE CATEGORY
// ============================================================================

/// Which bucket an expense is totalled under.
///
/// Serialized as the literal strings `"Personal"` / `"Business"`.
/// Icons and colors live in `presentation`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Personal,
    Business,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 2] = [ExpenseCategory::Personal, ExpenseCategory::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Personal => "Personal",
            ExpenseCategory::Business => "Business",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(ExpenseCategory::Personal),
            "business" => Ok(ExpenseCategory::Business),
            other => anyhow::bail!("Unknown expense category: {:?}", other),
        }
    }
}

// ============================================================================
// EXPENSE ITEM
// ============================================================================

/// Expense Entity
///
/// Fields are private so a constructed item cannot be edited in place.
/// The entity does not validate: callers trim the name and reject
/// non-positive amounts before construction (see `form::ExpenseDraft`).
#[derive(Debug, Clone)]
pub struct ExpenseItem {
    id: Uuid,
    name: String,
    category: ExpenseCategory,
    amount: f64,
    date: DateTime<Utc>,
}

impl ExpenseItem {
    /// Create a new expense dated now
    pub fn new(name: impl Into<String>, category: ExpenseCategory, amount: f64) -> Self {
        Self::with_date(name, category, amount, Utc::now())
    }

    /// Create a new expense with a caller-supplied date
    pub fn with_date(
        name: impl Into<String>,
        category: ExpenseCategory,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::from_parts(Uuid::new_v4(), name, category, amount, date)
    }

    /// Rebuild an expense whose identity already exists (used when decoding)
    pub fn from_parts(
        id: Uuid,
        name: impl Into<String>,
        category: ExpenseCategory,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Self {
        ExpenseItem {
            id,
            name: name.into(),
            category,
            amount,
            date,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ExpenseCategory {
        self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// True when every value (not just identity) matches
    #[cfg(test)]
    pub(crate) fn same_values(&self, other: &ExpenseItem) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.category == other.category
            && self.amount == other.amount
            && self.date == other.date
    }
}

impl PartialEq for ExpenseItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExpenseItem {}

impl Hash for ExpenseItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// TESTS
// ============================================================================
