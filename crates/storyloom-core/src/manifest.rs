//! Manifest source abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Protagonist listed for a project whose story does not name one.
pub const DEFAULT_PROTAGONIST: &str = "Unknown";

/// Language listed for a project whose story does not declare one.
pub const DEFAULT_LANGUAGE: &str = "English";

fn default_protagonist() -> String {
    DEFAULT_PROTAGONIST.to_owned()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_owned()
}

/// One playable project listed in the manifest.
///
/// Manifests written before `protagonist` and `language` existed still
/// parse; the missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Project identifier, also the directory name of its assets.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Name of the story's main character.
    #[serde(default = "default_protagonist")]
    pub protagonist: String,
    /// Language the story is written in.
    #[serde(default = "default_language")]
    pub language: String,
}

impl ProjectEntry {
    /// Creates an entry with the default protagonist and language.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            protagonist: default_protagonist(),
            language: default_language(),
        }
    }
}

/// Source of the ordered list of available projects.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Loads the manifest.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Transport` if the manifest is missing or cannot
    /// be read.
    async fn load_manifest(&self) -> Result<Vec<ProjectEntry>, PlayerError>;
}
