// ✍️ Expense Draft - Input validation owned by the presentation layer
//
// The store trusts what it is given, so screens build items through a
// draft: trimmed non-empty name, strictly positive amount.

use chrono::{DateTime, Utc};

use crate::entities::{ExpenseCategory, ExpenseItem};

/// Amount typed on a numeric keypad: only digits count, and they are cents.
///
/// `"1250"` -> 12.50, `"$12.50"` -> 12.50, no digits -> 0.
pub fn parse_keypad_amount(entry: &str) -> f64 {
    let digits: String = entry.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().map(|cents| cents / 100.0).unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub name: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: DateTime<Utc>,
}

impl ExpenseDraft {
    pub fn new(name: impl Into<String>, amount: f64, category: ExpenseCategory) -> Self {
        ExpenseDraft {
            name: name.into(),
            amount,
            category,
            date: Utc::now(),
        }
    }

    /// Draft from keypad entry (see `parse_keypad_amount`)
    pub fn from_keypad(name: impl Into<String>, entry: &str, category: ExpenseCategory) -> Self {
        Self::new(name, parse_keypad_amount(entry), category)
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn is_valid(&self) -> bool {
        !self.trimmed_name().is_empty() && self.amount.is_finite() && self.amount > 0.0
    }

    /// New expense with a fresh id, or `None` if the draft is not valid
    pub fn build(&self) -> Option<ExpenseItem> {
        if !self.is_valid() {
            return None;
        }

        Some(ExpenseItem::with_date(
            self.trimmed_name(),
            self.category,
            self.amount,
            self.date,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_keypad_amount() {
        assert_eq!(parse_keypad_amount("1250"), 12.5);
        assert_eq!(parse_keypad_amount("$12.50"), 12.5);
        assert_eq!(parse_keypad_amount("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_keypad_amount(""), 0.0);
        assert_eq!(parse_keypad_amount("abc"), 0.0);
    }

    #[test]
    fn test_build_trims_name() {
        let date = Utc.with_ymd_and_hms(2025, 6, 25, 0, 0, 0).unwrap();
        let draft = ExpenseDraft::new("  Coffee \n", 4.5, ExpenseCategory::Personal).on(date);

        let item = draft.build().unwrap();

        assert_eq!(item.name(), "Coffee");
        assert_eq!(item.amount(), 4.5);
        assert_eq!(item.date(), date);
    }

    #[test]
    fn test_rejects_blank_name() {
        let draft = ExpenseDraft::new("   ", 4.5, ExpenseCategory::Personal);

        assert!(!draft.is_valid());
        assert!(draft.build().is_none());
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        assert!(!ExpenseDraft::new("Coffee", 0.0, ExpenseCategory::Personal).is_valid());
        assert!(!ExpenseDraft::new("Coffee", -1.0, ExpenseCategory::Personal).is_valid());
        assert!(!ExpenseDraft::new("Coffee", f64::NAN, ExpenseCategory::Personal).is_valid());
        assert!(!ExpenseDraft::from_keypad("Coffee", "", ExpenseCategory::Personal).is_valid());
    }

    #[test]
    fn test_each_build_is_a_new_entity() {
        let draft = ExpenseDraft::from_keypad("Taxi", "3000", ExpenseCategory::Business);

        let a = draft.build().unwrap();
        let b = draft.build().unwrap();

        assert_eq!(a.amount(), 30.0);
        assert_ne!(a.id(), b.id());
    }
}
