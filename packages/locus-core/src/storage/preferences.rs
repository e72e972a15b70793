//! # Preference Store
//!
//! Durable key-value store for small settings, kept as one JSON object
//! on disk (`preferences.json`).
//!
//! ```text
//! {
//!   "darkMode": true,
//!   "locationPermission": "granted"
//! }
//! ```
//!
//! Writes go to a sibling temp file that is renamed over the original,
//! so readers see either the old object or the new one. The in-memory
//! copy only changes after the file write succeeds.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Key names for stored preferences
pub mod keys {
    /// Theme flag, JSON boolean
    pub const DARK_MODE: &str = "darkMode";

    /// Remembered answer to the location permission prompt
    pub const LOCATION_PERMISSION: &str = "locationPermission";
}

/// Per-installation preference storage
pub struct PreferenceStore {
    /// Backing file, `None` for in-memory stores
    path: Option<PathBuf>,
    values: RwLock<Map<String, Value>>,
}

impl PreferenceStore {
    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(Map::new()),
        }
    }

    /// Open the store backed by `path`
    ///
    /// A missing file is an empty store. A file that does not hold a
    /// JSON object is logged and treated as empty; it is replaced on the
    /// next successful [`set`](Self::set).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = Self::load(&path)?;

        tracing::debug!(path = %path.display(), entries = values.len(), "Preferences loaded");
        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// Open the store backed by `path`, falling back to an in-memory
    /// store if the file cannot be read
    pub fn open_or_memory(path: impl AsRef<Path>) -> Self {
        match Self::open(path.as_ref()) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    "Preferences unavailable, using defaults for this session: {}",
                    e
                );
                Self::in_memory()
            }
        }
    }

    fn load(path: &Path) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(Error::PreferenceError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => {
                tracing::warn!(
                    path = %path.display(),
                    "Preference file holds {} instead of an object, ignoring it",
                    json_kind(&other)
                );
                Ok(Map::new())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Preference file is corrupted, ignoring it: {}", e);
                Ok(Map::new())
            }
        }
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a value, `None` if never set
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Get a boolean value; `None` if absent or not a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().get(key).and_then(Value::as_bool)
    }

    /// Set a value and persist it
    ///
    /// On error nothing changes, in memory or on disk.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write();

        let mut next = values.clone();
        next.insert(key.to_string(), value);

        if let Some(path) = &self.path {
            write_atomically(path, &next)?;
        }

        *values = next;
        Ok(())
    }
}

fn write_atomically(path: &Path, values: &Map<String, Value>) -> Result<()> {
    let write_err = |e: std::io::Error| {
        Error::PreferenceError(format!("Failed to write {}: {}", path.display(), e))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let bytes = serde_json::to_vec_pretty(values)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
