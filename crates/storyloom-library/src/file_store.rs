//! JSON-file key-value store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use storyloom_core::error::PlayerError;
use storyloom_core::storage::KeyValueStore;

/// A key-value store persisted as one JSON object. Every write rewrites the
/// whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the file exists but cannot be read
    /// or is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PlayerError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                PlayerError::Storage(format!("corrupt store {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(PlayerError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PlayerError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PlayerError::Storage(format!("lock poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PlayerError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PlayerError::Storage(format!("lock poisoned: {e}")))?;
        entries.insert(key.to_owned(), value.to_owned());
        let json = serde_json::to_string_pretty(&*entries)
            .map_err(|e| PlayerError::Storage(format!("failed to serialize store: {e}")))?;
        fs::write(&self.path, json).map_err(|e| {
            PlayerError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!(key, "store entry written");
        Ok(())
    }
}
