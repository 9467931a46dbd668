// Storage module - key-value scopes backing the credential store
//
// Two scopes mirror what a browser gives a dashboard:
// - Durable: a JSON object on disk that survives restarts and is shared by
//   every process pointed at the same data directory
// - Session-scoped: an in-memory map that dies with the process
//
// Each durable write rewrites the whole file through a temp file + rename so
// a crash mid-write never leaves a truncated credentials file behind.

mod credentials;
mod settings;

pub use credentials::{
    CredentialRecord, CredentialStore, PersistenceMode, AUTHENTICATED_KEY, REFRESH_TOKEN_KEY,
    REMEMBER_ME_KEY, SETTINGS_KEY, TOKEN_KEY,
};
pub use settings::AppSettings;

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A string key-value scope
///
/// Implementations may fail; callers that promise best-effort semantics
/// (the credential store) swallow and log the errors.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Durable scope stored as a flat JSON object in a single file
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Malformed storage file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let json = serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("Failed to write storage file")?;
        fs::rename(&tmp, &self.path).context("Failed to replace storage file")?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if apply(&mut entries) {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// Session-scoped store living only as long as the process
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
