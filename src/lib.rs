// Expense Ledger - Core Library
// Expense entities, their persistence, and the store the screens read from

pub mod entities;
pub mod codec;
pub mod backend;
pub mod db;
pub mod scheduler;
pub mod store;
pub mod presentation;
pub mod form;
pub mod config;

// Re-export commonly used types
pub use entities::{ExpenseCategory, ExpenseItem};
pub use codec::{decode, encode, try_decode};
pub use backend::{JsonFileBackend, KeyValueBackend, MemoryBackend};
pub use db::{setup_database, SqliteBackend};
pub use scheduler::{Clock, DelayedTasks, ManualClock, SystemClock, TaskHandle};
pub use store::{
    ErrorHook, ExpenseStore, PersistOp, PersistenceFailure, StoreOptions,
    DEFAULT_HIGHLIGHT_DELAY, DEFAULT_ITEMS_KEY,
};
pub use presentation::{
    category_style, format_amount, summary_cards,
    AmountTier, CategoryStyle, DisplayColor, SummaryCard,
};
pub use form::{parse_keypad_amount, ExpenseDraft};
pub use config::{BackendKind, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
