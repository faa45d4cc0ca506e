// 🧾 Expense Store - In-memory expenses with write-through persistence
//
// Lifecycle:
// 1. `open` reads the single payload under the store key and decodes it
//    (absent or unreadable payload -> empty store, never an error)
// 2. `add` / `remove` / `remove_all` change `items`, then re-encode and
//    rewrite the whole collection, every time
// 3. Aggregates are recomputed from `items` on every call
//
// Recently added ids are "highlighted" until their expiry task comes due.
// The owner drives expiry by calling `run_due_expiries` from its loop.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::KeyValueBackend;
use crate::codec;
use crate::entities::{ExpenseCategory, ExpenseItem};
use crate::scheduler::{Clock, DelayedTasks, SystemClock, TaskHandle};

/// Backend key the expenses payload is stored under
pub const DEFAULT_ITEMS_KEY: &str = "Items";

/// How long a freshly added expense stays highlighted
pub const DEFAULT_HIGHLIGHT_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// PERSISTENCE FAILURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOp {
    Load,
    Save,
}

impl PersistOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistOp::Load => "load",
            PersistOp::Save => "save",
        }
    }
}

/// A swallowed load/save error, handed to the error hook if one is set
#[derive(Debug)]
pub struct PersistenceFailure {
    pub op: PersistOp,
    pub key: String,
    pub error: anyhow::Error,
}

impl fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {:?} failed: {:#}", self.op.as_str(), self.key, self.error)
    }
}

pub type ErrorHook = Box<dyn FnMut(&PersistenceFailure)>;

// ============================================================================
// OPTIONS
// ============================================================================

pub struct StoreOptions {
    pub key: String,
    pub highlight_delay: Duration,
    pub clock: Arc<dyn Clock>,
    pub error_hook: Option<ErrorHook>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            key: DEFAULT_ITEMS_KEY.to_string(),
            highlight_delay: DEFAULT_HIGHLIGHT_DELAY,
            clock: Arc::new(SystemClock),
            error_hook: None,
        }
    }
}

impl StoreOptions {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn highlight_delay(mut self, delay: Duration) -> Self {
        self.highlight_delay = delay;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Receive load/save failures (they are still swallowed by the store)
    pub fn error_hook(mut self, hook: impl FnMut(&PersistenceFailure) + 'static) -> Self {
        self.error_hook = Some(Box::new(hook));
        self
    }
}

// ============================================================================
// EXPENSE STORE
// ============================================================================

pub struct ExpenseStore {
    backend: Box<dyn KeyValueBackend>,
    key: String,
    items: Vec<ExpenseItem>,
    highlighted: HashSet<Uuid>,
    highlight_delay: Duration,
    expiries: DelayedTasks<Uuid>,
    expiry_handles: HashMap<Uuid, TaskHandle>,
    error_hook: Option<ErrorHook>,
}

impl ExpenseStore {
    /// Open a store on `backend` and load whatever it holds
    pub fn open(backend: impl KeyValueBackend + 'static, options: StoreOptions) -> Self {
        let mut store = ExpenseStore {
            backend: Box::new(backend),
            key: options.key,
            items: Vec::new(),
            highlighted: HashSet::new(),
            highlight_delay: options.highlight_delay,
            expiries: DelayedTasks::new(options.clock),
            expiry_handles: HashMap::new(),
            error_hook: options.error_hook,
        };
        store.load();
        store
    }

    /// Open with the default key ("Items"), one second highlights and the
    /// system clock
    pub fn with_defaults(backend: impl KeyValueBackend + 'static) -> Self {
        Self::open(backend, StoreOptions::default())
    }

    pub fn set_error_hook(&mut self, hook: impl FnMut(&PersistenceFailure) + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    fn load(&mut self) {
        let payload = match self.backend.get(&self.key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key = %self.key, "no saved expenses, starting empty");
                return;
            }
            Err(err) => {
                self.report(PersistOp::Load, err);
                return;
            }
        };

        match codec::try_decode(&payload) {
            Ok(decoded) => {
                let mut seen = HashSet::with_capacity(decoded.len());
                self.items = decoded
                    .into_iter()
                    .filter(|item| seen.insert(item.id()))
                    .collect();
                debug!(key = %self.key, count = self.items.len(), "loaded expenses");
            }
            Err(err) => self.report(PersistOp::Load, err),
        }
    }

    /// Re-encode the whole collection and overwrite the stored payload
    fn persist(&mut self) {
        let result = codec::encode(&self.items)
            .and_then(|payload| self.backend.set(&self.key, &payload));

        match result {
            Ok(()) => debug!(key = %self.key, count = self.items.len(), "saved expenses"),
            Err(err) => self.report(PersistOp::Save, err),
        }
    }

    fn report(&mut self, op: PersistOp, error: anyhow::Error) {
        let failure = PersistenceFailure {
            op,
            key: self.key.clone(),
            error,
        };
        warn!("{}", failure);

        if let Some(hook) = self.error_hook.as_mut() {
            hook(&failure);
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Append an expense, highlight it, and save.
    ///
    /// The item is expected to be validated already. An item whose id is
    /// already stored is not appended twice.
    pub fn add(&mut self, item: ExpenseItem) {
        self.run_due_expiries();
        let id = item.id();

        if self.contains(id) {
            debug!(%id, "expense already stored, not appending");
        } else {
            self.items.push(item);
            self.highlight(id);
        }

        self.persist();
    }

    /// Remove every expense whose id is in `ids`; unknown ids are ignored
    pub fn remove<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = Uuid>,
    {
        self.run_due_expiries();
        let ids: HashSet<Uuid> = ids.into_iter().collect();
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id()));
        debug!(removed = before - self.items.len(), "removed expenses");

        self.persist();
    }

    /// Remove by position within one category's list (list-row deletion)
    pub fn remove_at(&mut self, category: ExpenseCategory, offsets: &[usize]) {
        let ids: Vec<Uuid> = {
            let rows = self.by_category(category);
            offsets
                .iter()
                .filter_map(|&offset| rows.get(offset).map(|item| item.id()))
                .collect()
        };
        self.remove(ids);
    }

    pub fn remove_all(&mut self) {
        self.run_due_expiries();
        self.items.clear();
        self.persist();
    }

    // ========================================================================
    // HIGHLIGHTS
    // ========================================================================

    fn highlight(&mut self, id: Uuid) {
        if let Some(previous) = self.expiry_handles.remove(&id) {
            self.expiries.cancel(previous);
        }

        self.highlighted.insert(id);
        let handle = self.expiries.schedule(id, self.highlight_delay);
        self.expiry_handles.insert(id, handle);
    }

    /// False as soon as the id's delay has elapsed, even if the due
    /// expiry has not been run yet
    pub fn is_highlighted(&self, id: Uuid) -> bool {
        if !self.highlighted.contains(&id) {
            return false;
        }

        self.expiry_handles
            .get(&id)
            .and_then(|handle| self.expiries.remaining(*handle))
            .map_or(true, |left| left > Duration::ZERO)
    }

    /// Clear a highlight before its timer fires
    pub fn clear_highlight(&mut self, id: Uuid) {
        if let Some(handle) = self.expiry_handles.remove(&id) {
            self.expiries.cancel(handle);
        }
        self.highlighted.remove(&id);
    }

    /// Expire every highlight whose delay has elapsed.
    ///
    /// Mutators call this first; a host loop can also call it directly.
    /// Returns how many timers fired. A timer for an expense that was
    /// removed meanwhile still fires and is a no-op.
    pub fn run_due_expiries(&mut self) -> usize {
        let due = self.expiries.take_due();
        for id in &due {
            self.expiry_handles.remove(id);
            self.highlighted.remove(id);
            debug!(%id, "highlight expired");
        }
        due.len()
    }

    /// When the next highlight expires, if any is pending
    pub fn next_expiry(&self) -> Option<Instant> {
        self.expiries.next_deadline()
    }

    pub fn pending_expiries(&self) -> usize {
        self.expiries.len()
    }

    /// Cancel all pending highlight timers
    pub fn shutdown(&mut self) {
        let cancelled = self.expiries.cancel_all();
        self.expiry_handles.clear();
        debug!(cancelled, "cancelled pending highlight expiries");
    }

    // ========================================================================
    // READ VIEWS
    // ========================================================================

    pub fn items(&self) -> &[ExpenseItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ExpenseItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn by_category(&self, category: ExpenseCategory) -> Vec<&ExpenseItem> {
        self.items
            .iter()
            .filter(|item| item.category() == category)
            .collect()
    }

    pub fn total_for(&self, category: ExpenseCategory) -> f64 {
        self.by_category(category)
            .iter()
            .map(|item| item.amount())
            .sum()
    }

    pub fn grand_total(&self) -> f64 {
        self.items.iter().map(|item| item.amount()).sum()
    }
}

impl Drop for ExpenseStore {
    fn drop(&mut self) {
        if !self.expiries.is_empty() {
            self.shutdown();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
