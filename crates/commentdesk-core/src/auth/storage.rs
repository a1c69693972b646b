//! Durable key-value storage backing the session store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use thiserror::Error;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name used by `KeyringStorage`
const SERVICE_NAME: &str = "commentdesk";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// String-keyed durable storage.
///
/// Implementations only need `get`, `set` and `remove`. Backends that can
/// write several keys in one step override `set_many` / `remove_many`.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// Stores all keys in one JSON object on disk.
///
/// Every write rewrites the whole file through a temporary file and a rename,
/// so a multi-key update lands in a single step.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `<dir>/session.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut values = self.read_all()?;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&values)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut values = self.read_all()?;
        let before = values.len();
        for key in keys {
            values.remove(*key);
        }
        if values.len() == before {
            return Ok(());
        }
        self.write_all(&values)
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// One keychain entry per key, under the `commentdesk` service.
#[derive(Debug, Default)]
pub struct KeyringStorage;

impl KeyringStorage {
    pub fn new() -> Self {
        Self
    }

    fn entry(key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(SERVICE_NAME, key)?)
    }
}

impl KeyValueStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
