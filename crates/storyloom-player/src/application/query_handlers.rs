//! Query handlers for the project list and the gallery.
//!
//! These read the store and manifest directly and return read-only view DTOs;
//! no session is needed.

use serde::Serialize;
use storyloom_core::assets::{AssetKind, AssetLayout};
use storyloom_core::error::PlayerError;
use storyloom_core::manifest::ManifestSource;
use storyloom_core::storage::{KeyValueStore, save_state_key};

use crate::application::tag_handler::load_gallery;
use crate::domain::gallery::ImageBucket;

/// A selectable project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    /// Project identifier (the folder name).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Main character named by the story.
    pub protagonist: String,
    /// Language the story is written in.
    pub language: String,
    /// Whether a save exists, so "resume" can be offered.
    pub has_save: bool,
}

/// Lists the manifest's projects in manifest order.
///
/// # Errors
///
/// Returns `PlayerError::Transport` if the manifest cannot be loaded.
pub async fn list_projects(
    manifest: &dyn ManifestSource,
    store: &dyn KeyValueStore,
) -> Result<Vec<ProjectSummary>, PlayerError> {
    let entries = manifest.load_manifest().await?;
    Ok(entries
        .into_iter()
        .map(|entry| ProjectSummary {
            has_save: has_saved_progress(store, &entry.id),
            id: entry.id,
            title: entry.title,
            protagonist: entry.protagonist,
            language: entry.language,
        })
        .collect())
}

/// Whether `project_id` has saved progress. An unreadable store counts as no
/// save.
#[must_use]
pub fn has_saved_progress(store: &dyn KeyValueStore, project_id: &str) -> bool {
    matches!(store.get(&save_state_key(project_id)), Ok(Some(_)))
}

/// One unlocked image as shown in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    /// Image file name.
    pub file: String,
    /// Resolved asset path.
    pub path: String,
}

/// Read-only view of one gallery bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryView {
    /// The project.
    pub project_id: String,
    /// Which bucket.
    pub bucket: ImageBucket,
    /// Images in unlock order.
    pub images: Vec<GalleryImage>,
    /// Placeholder text when nothing is unlocked.
    pub empty_message: Option<String>,
}

/// Builds the gallery view of one bucket from the persisted unlock set.
#[must_use]
pub fn gallery_view(
    store: &dyn KeyValueStore,
    layout: &AssetLayout,
    project_id: &str,
    bucket: ImageBucket,
) -> GalleryView {
    let gallery = load_gallery(store, project_id);
    let images: Vec<_> = gallery
        .images(bucket)
        .iter()
        .map(|file| GalleryImage {
            file: file.clone(),
            path: layout.asset_path(project_id, AssetKind::Image, file),
        })
        .collect();
    let empty_message = images
        .is_empty()
        .then(|| format!("No {} unlocked yet.", bucket.name()));
    GalleryView {
        project_id: project_id.to_owned(),
        bucket,
        images,
        empty_message,
    }
}
