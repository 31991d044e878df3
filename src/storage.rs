//! Local persistence for the task list and focus history.
//!
//! Both records live in a small string key-value store. Every failure is
//! logged and degrades to an empty value on read or a dropped write; the
//! in-memory state stays authoritative.

use crate::error::StorageError;
use crate::history::History;
use crate::task::Task;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

pub const TASKS_KEY: &str = "focusflow_tasks";
pub const HISTORY_KEY: &str = "focusflow_history";
pub const DATA_DIR_ENV: &str = "FOCUSFLOW_DATA_DIR";

pub trait KvStore {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replaces the whole value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the two application records through a [`KvStore`].
pub struct Persistence {
    store: Box<dyn KvStore>,
}

impl Persistence {
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    pub fn load_tasks(&self) -> Vec<Task> {
        self.load_json(TASKS_KEY)
    }

    pub fn save_tasks(&self, tasks: &[Task]) {
        self.save_json(TASKS_KEY, tasks);
    }

    pub fn load_history(&self) -> History {
        self.load_json(HISTORY_KEY)
    }

    pub fn save_history(&self, history: &History) {
        self.save_json(HISTORY_KEY, history);
    }

    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "no stored record, starting empty");
                return T::default();
            }
            Err(e) => {
                error!(key, error = %e, "failed to read record");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored record is not valid, starting empty");
            T::default()
        })
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(key, &json));
        if let Err(e) = result {
            error!(key, error = %e, "failed to save record; change kept in memory only");
        }
    }
}

/// Resolves the data directory: explicit path, then `FOCUSFLOW_DATA_DIR`,
/// then the platform data directory.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf, StorageError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::data_local_dir()
        .map(|d| d.join("focusflow"))
        .ok_or(StorageError::NoDataDir)
}
