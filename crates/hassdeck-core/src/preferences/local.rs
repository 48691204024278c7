// ── Local preference storage ──
//
// Key → JSON document storage on this machine. Values that cannot be
// read or parsed are treated as absent.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;

pub trait LocalStore: Send + Sync {
    /// The stored document, or `None` if missing or unreadable.
    fn read(&self, key: &str) -> Option<Value>;

    fn write(&self, key: &str, value: &Value) -> Result<(), CoreError>;
}

// ── JSON files ──────────────────────────────────────────────────────

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<Value> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable preference file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed preference file");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), CoreError> {
        let storage = |e: std::io::Error| CoreError::Storage {
            message: format!("{}: {e}", self.dir.display()),
        };

        fs::create_dir_all(&self.dir).map_err(storage)?;
        let body = serde_json::to_string_pretty(value).map_err(|e| CoreError::Storage {
            message: e.to_string(),
        })?;

        // Replace atomically.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(storage)?;
        fs::rename(&tmp, &path).map_err(storage)?;
        debug!(path = %path.display(), "preference saved");
        Ok(())
    }
}

// ── In memory ───────────────────────────────────────────────────────

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    pub fn with(self, key: &str, value: Value) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
        self
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.clone());
        Ok(())
    }
}
