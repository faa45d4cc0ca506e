// 🗄️ Key-Value Backends - Where the single expenses payload lives
//
// The store only ever needs two calls: read one key, overwrite one key.
// Anything that can do that (memory, a JSON file, SQLite in `db.rs`)
// can back an `ExpenseStore`.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ============================================================================
// BACKEND TRAIT
// ============================================================================

pub trait KeyValueBackend {
    /// Read the value under `key`; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key` with `value`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

// ============================================================================
// MEMORY BACKEND
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

/// In-process backend.
///
/// Clones share the same map, so a caller can hand one clone to a store
/// and keep another to see what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let backend = Self::new();
        backend
            .lock()
            .entries
            .insert(key.to_string(), value.to_string());
        backend
    }

    /// Make every following `set` fail (simulates an unavailable backend)
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Current value under `key`, bypassing the trait
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock();
        anyhow::ensure!(!state.fail_writes, "Memory backend is refusing writes");

        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}

// ============================================================================
// JSON FILE BACKEND
// ============================================================================

/// Every key lives in one JSON object on disk: `{"Items": "<payload>"}`.
///
/// A missing file reads as an empty map. Writes go to a sibling `.tmp`
/// file which is then renamed over the original, so a reader never sees
/// a half-written map.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBackend { path: path.into() }
    }

    /// Sibling file the next write is staged in before being renamed over
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {:?}", self.path))
            }
        };

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse key-value file {:?}", self.path))
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let content = serde_json::to_string_pretty(&map)?;
        let staging = self.staging_path();
        fs::write(&staging, content)
            .with_context(|| format!("Failed to write {:?}", staging))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_backend_shares_state_between_clones() {
        let observer = MemoryBackend::new();
        let mut writer = observer.clone();

        assert_eq!(writer.get("Items").unwrap(), None);

        writer.set("Items", "[]").unwrap();

        assert_eq!(observer.value("Items"), Some("[]".to_string()));
        assert_eq!(observer.write_count(), 1);
    }

    #[test]
    fn test_memory_backend_fail_writes() {
        let mut backend = MemoryBackend::with_entry("Items", "old");
        backend.fail_writes(true);

        assert!(backend.set("Items", "new").is_err());
        assert_eq!(backend.value("Items"), Some("old".to_string()));

        backend.fail_writes(false);
        backend.set("Items", "new").unwrap();
        assert_eq!(backend.value("Items"), Some("new".to_string()));
    }

    #[test]
    fn test_json_file_backend_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("missing.json"));

        assert_eq!(backend.get("Items").unwrap(), None);
    }

    #[test]
    fn test_json_file_backend_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut backend = JsonFileBackend::new(&path);

        backend.set("Items", "[1]").unwrap();
        backend.set("Other", "x").unwrap();
        backend.set("Items", "[2]").unwrap();

        let reopened = JsonFileBackend::new(&path);
        assert_eq!(reopened.get("Items").unwrap(), Some("[2]".to_string()));
        assert_eq!(reopened.get("Other").unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_json_file_backend_replaces_file_via_staging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let staging = dir.path().join("state.json.tmp");
        let mut backend = JsonFileBackend::new(&path);

        backend.set("Items", "[1]").unwrap();
        assert!(path.exists());
        assert!(!staging.exists());

        // Leftover from an interrupted write: the committed file still wins
        fs::write(&staging, "{\"Items\": \"[trunc").unwrap();
        assert_eq!(backend.get("Items").unwrap(), Some("[1]".to_string()));

        backend.set("Items", "[2]").unwrap();
        assert!(!staging.exists());
        assert_eq!(backend.get("Items").unwrap(), Some("[2]".to_string()));
    }

    #[test]
    fn test_json_file_backend_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, "not json").unwrap();

        let backend = JsonFileBackend::new(&path);
        assert!(backend.get("Items").is_err());
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let observer = MemoryBackend::new();
        let mut boxed: Box<dyn KeyValueBackend> = Box::new(observer.clone());

        boxed.set("Items", "[]").unwrap();

        assert_eq!(boxed.get("Items").unwrap(), Some("[]".to_string()));
        assert_eq!(observer.value("Items"), Some("[]".to_string()));
    }
}
