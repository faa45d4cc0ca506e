use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{JsonFileBackend, KeyValueBackend, MemoryBackend};
use crate::db::SqliteBackend;
use crate::store::{StoreOptions, DEFAULT_ITEMS_KEY};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Database or JSON file location (ignored by the memory backend)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    #[serde(default = "default_key")]
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HighlightConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("expenses.db")
}

fn default_key() -> String {
    DEFAULT_ITEMS_KEY.to_string()
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: BackendKind::default(),
            path: default_storage_path(),
            key: default_key(),
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            currency: default_currency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Read a TOML config; a missing file gives defaults, a broken one
    /// gives defaults with a warning
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight.delay_ms)
    }

    /// Store options for this config (system clock, no error hook)
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::default()
            .key(self.storage.key.clone())
            .highlight_delay(self.highlight_delay())
    }
}

impl StorageConfig {
    pub fn open_backend(&self) -> Result<Box<dyn KeyValueBackend>> {
        let backend: Box<dyn KeyValueBackend> = match self.backend {
            BackendKind::Sqlite => Box::new(SqliteBackend::open(&self.path)?),
            BackendKind::File => Box::new(JsonFileBackend::new(&self.path)),
            BackendKind::Memory => Box::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.storage.backend, BackendKind::Sqlite);
        assert_eq!(config.storage.path, PathBuf::from("expenses.db"));
        assert_eq!(config.storage.key, "Items");
        assert_eq!(config.highlight_delay(), Duration::from_secs(1));
        assert_eq!(config.display.currency, "USD");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = Config::parse(
            r#"
            [storage]
            backend = "file"
            path = "/tmp/expenses.json"

            [highlight]
            delay_ms = 250

            [display]
            currency = "BRL"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, BackendKind::File);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/expenses.json"));
        assert_eq!(config.storage.key, "Items");
        assert_eq!(config.highlight_delay(), Duration::from_millis(250));
        assert_eq!(config.display.currency, "BRL");
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        assert!(Config::parse("[storage]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load(&dir.path().join("missing.toml"));

        assert_eq!(config.storage.key, "Items");
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expense-ledger.toml");
        std::fs::write(&path, "[highlight]\ndelay_ms = 50\n").unwrap();

        let config = Config::load(&path);

        assert_eq!(config.highlight_delay(), Duration::from_millis(50));
        assert_eq!(config.storage.backend, BackendKind::Sqlite);
    }

    #[test]
    fn test_memory_backend_from_config() {
        let config = Config::parse("[storage]\nbackend = \"memory\"").unwrap();

        let backend = config.storage.open_backend().unwrap();

        assert_eq!(backend.get("Items").unwrap(), None);
    }
}
