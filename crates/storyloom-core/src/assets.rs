//! Asset layout and transport.
//!
//! Every project lives under a common base: the compiled story at
//! `<base>/<project>/adventure.json`, images under `assets/` and audio under
//! `audio/`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// File name of a project's compiled story.
pub const STORY_FILE_NAME: &str = "adventure.json";

/// Kind of binary asset a project ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Background and reward images.
    Image,
    /// Ambient audio tracks.
    Audio,
}

impl AssetKind {
    /// Directory name of this kind of asset within a project.
    #[must_use]
    pub fn directory(self) -> &'static str {
        match self {
            Self::Image => "assets",
            Self::Audio => "audio",
        }
    }
}

/// Resolves project-relative file names into fetchable paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    base: String,
}

impl AssetLayout {
    /// Creates a layout rooted at `base` (trailing slashes are ignored).
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Path of an image or audio file.
    #[must_use]
    pub fn asset_path(&self, project_id: &str, kind: AssetKind, file: &str) -> String {
        format!("{}/{project_id}/{}/{file}", self.base, kind.directory())
    }

    /// Path of a project's compiled story.
    #[must_use]
    pub fn story_path(&self, project_id: &str) -> String {
        format!("{}/{project_id}/{STORY_FILE_NAME}", self.base)
    }
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self::new("/data/output")
    }
}

/// Fetches story payloads and asset bytes.
#[async_trait]
pub trait AssetTransport: Send + Sync {
    /// Fetches the compiled story of a project.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NotFound` if the project has no story, or
    /// `PlayerError::Transport` on any other fetch failure.
    async fn fetch_story(&self, project_id: &str) -> Result<String, PlayerError>;

    /// Fetches an image or audio file of a project.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NotFound` if the file does not exist, or
    /// `PlayerError::Transport` on any other fetch failure.
    async fn fetch_asset(
        &self,
        project_id: &str,
        kind: AssetKind,
        file: &str,
    ) -> Result<Vec<u8>, PlayerError>;
}
