//! Directory-backed manifest source and asset transport.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use storyloom_core::assets::{AssetKind, AssetTransport, STORY_FILE_NAME};
use storyloom_core::error::PlayerError;
use storyloom_core::manifest::{ManifestSource, ProjectEntry};

use crate::manifest::MANIFEST_FILE_NAME;

/// A story library rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    /// Creates a library over `root`. The directory is not touched until the
    /// first read.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The library root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn story_path(&self, project_id: &str) -> Result<PathBuf, PlayerError> {
        Ok(self
            .root
            .join(validate_segment(project_id)?)
            .join(STORY_FILE_NAME))
    }

    fn asset_path(
        &self,
        project_id: &str,
        kind: AssetKind,
        file: &str,
    ) -> Result<PathBuf, PlayerError> {
        Ok(self
            .root
            .join(validate_segment(project_id)?)
            .join(kind.directory())
            .join(validate_segment(file)?))
    }
}

/// Checks that `segment` names a single entry inside its parent directory.
///
/// # Errors
///
/// Returns `PlayerError::Validation` for empty segments, `.` / `..`, or
/// segments containing a path separator.
pub fn validate_segment(segment: &str) -> Result<&str, PlayerError> {
    if segment.is_empty()
        || segment == "."
        || segment.contains("..")
        || segment.contains(['/', '\\'])
    {
        return Err(PlayerError::Validation(format!(
            "invalid path segment: {segment:?}"
        )));
    }
    Ok(segment)
}

fn read_error(path: &Path, e: &io::Error) -> PlayerError {
    if e.kind() == io::ErrorKind::NotFound {
        PlayerError::NotFound(path.display().to_string())
    } else {
        PlayerError::Transport(format!("failed to read {}: {e}", path.display()))
    }
}

#[async_trait]
impl ManifestSource for DirectoryLibrary {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load_manifest(&self) -> Result<Vec<ProjectEntry>, PlayerError> {
        let path = self.root.join(MANIFEST_FILE_NAME);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PlayerError::Transport(format!("failed to read {}: {e}", path.display())))?;
        let entries: Vec<ProjectEntry> = serde_json::from_str(&raw)
            .map_err(|e| PlayerError::Transport(format!("invalid manifest: {e}")))?;
        debug!(projects = entries.len(), "manifest loaded");
        Ok(entries)
    }
}

#[async_trait]
impl AssetTransport for DirectoryLibrary {
    async fn fetch_story(&self, project_id: &str) -> Result<String, PlayerError> {
        let path = self.story_path(project_id)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| read_error(&path, &e))
    }

    async fn fetch_asset(
        &self,
        project_id: &str,
        kind: AssetKind,
        file: &str,
    ) -> Result<Vec<u8>, PlayerError> {
        let path = self.asset_path(project_id, kind, file)?;
        tokio::fs::read(&path).await.map_err(|e| read_error(&path, &e))
    }
}
