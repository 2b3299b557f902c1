//! Key-value store abstraction.
//!
//! Mirrors browser local storage: string keys, string values, synchronous
//! access. Keys are namespaced by project id.

use crate::error::PlayerError;

/// Global key holding the typewriter preference (`"true"` / `"false"`).
pub const TYPEWRITER_PREFERENCE_KEY: &str = "typewriter_enabled";

/// Key under which the serialized engine state of a project is saved.
#[must_use]
pub fn save_state_key(project_id: &str) -> String {
    format!("save_state_{project_id}")
}

/// Key under which the unlocked image set of a project is saved.
#[must_use]
pub fn unlocked_art_key(project_id: &str) -> String {
    format!("unlocked_art_{project_id}")
}

/// Persistent string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PlayerError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PlayerError>;
}
