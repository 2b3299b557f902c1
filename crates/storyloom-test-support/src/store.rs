//! Test stores — in-memory `KeyValueStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use storyloom_core::error::PlayerError;
use storyloom_core::storage::KeyValueStore;

/// A store backed by a `HashMap` that records every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut map = store.entries.lock().unwrap();
            for (key, value) in entries {
                map.insert((*key).to_owned(), (*value).to_owned());
            }
        }
        store
    }

    /// Returns the current value of a key.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Returns a snapshot of every write, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PlayerError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PlayerError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_owned(), value.to_owned()));
        Ok(())
    }
}

/// A store that always returns a storage error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PlayerError> {
        Err(PlayerError::Storage("quota exceeded".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PlayerError> {
        Err(PlayerError::Storage("quota exceeded".into()))
    }
}
