// Entity Models
//
// An expense has:
// - Stable identity (UUID) generated at creation, never changes
// - Immutable values (name, category, amount, date)
// Corrections are a remove + re-insert of a new entity with a new UUID.

pub mod expense;

pub use expense::{ExpenseCategory, ExpenseItem};
