//! Test transports — in-memory manifest and asset sources for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use storyloom_core::assets::{AssetKind, AssetTransport};
use storyloom_core::error::PlayerError;
use storyloom_core::manifest::{ManifestSource, ProjectEntry};

/// A manifest source that returns a fixed project list.
#[derive(Debug, Clone, Default)]
pub struct StaticManifest(pub Vec<ProjectEntry>);

impl StaticManifest {
    /// Create a manifest from `(id, title)` pairs.
    #[must_use]
    pub fn of(projects: &[(&str, &str)]) -> Self {
        Self(
            projects
                .iter()
                .map(|(id, title)| ProjectEntry::new(*id, *title))
                .collect(),
        )
    }
}

#[async_trait]
impl ManifestSource for StaticManifest {
    async fn load_manifest(&self) -> Result<Vec<ProjectEntry>, PlayerError> {
        Ok(self.0.clone())
    }
}

/// A manifest source that always fails with a transport error.
#[derive(Debug)]
pub struct FailingManifest;

#[async_trait]
impl ManifestSource for FailingManifest {
    async fn load_manifest(&self) -> Result<Vec<ProjectEntry>, PlayerError> {
        Err(PlayerError::Transport("manifest not found (HTTP 404)".into()))
    }
}

/// An asset transport serving stories and files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    stories: HashMap<String, String>,
    files: HashMap<(String, AssetKind, String), Vec<u8>>,
}

impl MemoryAssets {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the compiled story of a project.
    #[must_use]
    pub fn with_story(mut self, project_id: &str, payload: impl Into<String>) -> Self {
        self.stories.insert(project_id.to_owned(), payload.into());
        self
    }

    /// Register an image or audio file of a project.
    #[must_use]
    pub fn with_file(mut self, project_id: &str, kind: AssetKind, file: &str, bytes: &[u8]) -> Self {
        self.files.insert(
            (project_id.to_owned(), kind, file.to_owned()),
            bytes.to_vec(),
        );
        self
    }
}

#[async_trait]
impl AssetTransport for MemoryAssets {
    async fn fetch_story(&self, project_id: &str) -> Result<String, PlayerError> {
        self.stories
            .get(project_id)
            .cloned()
            .ok_or_else(|| PlayerError::NotFound(format!("story for project {project_id}")))
    }

    async fn fetch_asset(
        &self,
        project_id: &str,
        kind: AssetKind,
        file: &str,
    ) -> Result<Vec<u8>, PlayerError> {
        self.files
            .get(&(project_id.to_owned(), kind, file.to_owned()))
            .cloned()
            .ok_or_else(|| PlayerError::NotFound(format!("{project_id}/{file}")))
    }
}

/// An asset transport that always fails with a transport error.
#[derive(Debug)]
pub struct FailingTransport;

#[async_trait]
impl AssetTransport for FailingTransport {
    async fn fetch_story(&self, _project_id: &str) -> Result<String, PlayerError> {
        Err(PlayerError::Transport("connection refused".into()))
    }

    async fn fetch_asset(
        &self,
        _project_id: &str,
        _kind: AssetKind,
        _file: &str,
    ) -> Result<Vec<u8>, PlayerError> {
        Err(PlayerError::Transport("connection refused".into()))
    }
}
