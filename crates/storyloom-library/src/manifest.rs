//! Manifest generation from a story output directory.

use std::path::Path;

use tracing::{info, warn};

use storyloom_core::assets::STORY_FILE_NAME;
use storyloom_core::error::PlayerError;
use storyloom_core::manifest::ProjectEntry;

/// File name of the manifest at the library root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Ink source kept next to the compiled story; read for project metadata.
pub const INK_SOURCE_FILE_NAME: &str = "adventure.ink";

/// Display title for a project folder: underscores become spaces and every
/// word is capitalized.
#[must_use]
pub fn title_from_folder(folder: &str) -> String {
    let mut title = String::with_capacity(folder.len());
    let mut in_word = false;
    for c in folder.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            title.push(c);
            in_word = false;
        }
    }
    title
}

/// Value of a global string variable declared in ink source as
/// `VAR <name> = "<value>"`. Empty values count as undeclared.
#[must_use]
pub fn ink_variable(source: &str, name: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("VAR")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start().strip_prefix(name)?;
        let rest = rest.trim_start().strip_prefix('=')?;
        let rest = rest.trim_start().strip_prefix('"')?;
        let (value, _) = rest.split_once('"')?;
        (!value.is_empty()).then(|| value.to_owned())
    })
}

/// Builds the manifest entry for a project folder, taking protagonist and
/// language from its ink source when present.
async fn project_entry(id: String, dir: &Path) -> ProjectEntry {
    let title = title_from_folder(&id);
    let mut entry = ProjectEntry::new(id, title);
    let path = dir.join(INK_SOURCE_FILE_NAME);
    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return entry,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ink source unreadable, using default metadata");
            return entry;
        }
    };
    if let Some(protagonist) = ink_variable(&source, "protagonist_name") {
        entry.protagonist = protagonist;
    }
    if let Some(language) = ink_variable(&source, "language") {
        entry.language = language;
    }
    entry
}

/// Lists every sub-directory of `root` that holds a compiled story, ordered
/// by id. Symlinked folders are not followed.
///
/// # Errors
///
/// Returns `PlayerError::Storage` if `root` cannot be listed.
pub async fn scan_projects(root: &Path) -> Result<Vec<ProjectEntry>, PlayerError> {
    let storage_err =
        |e: std::io::Error| PlayerError::Storage(format!("failed to scan {}: {e}", root.display()));
    let mut dir = tokio::fs::read_dir(root).await.map_err(storage_err)?;

    let mut projects = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(storage_err)? {
        if !entry.file_type().await.map_err(storage_err)?.is_dir() {
            continue;
        }
        let path = entry.path();
        let Ok(id) = entry.file_name().into_string() else {
            warn!(path = %path.display(), "skipping project folder with non-UTF-8 name");
            continue;
        };
        if !tokio::fs::try_exists(path.join(STORY_FILE_NAME))
            .await
            .unwrap_or(false)
        {
            continue;
        }
        projects.push(project_entry(id, &path).await);
    }
    projects.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(projects)
}

/// Rescans `root` and rewrites its manifest. Returns the number of projects
/// listed.
///
/// # Errors
///
/// Returns `PlayerError::Storage` if the directory cannot be scanned or the
/// manifest cannot be written.
pub async fn write_manifest(root: &Path) -> Result<usize, PlayerError> {
    let projects = scan_projects(root).await?;
    let json = serde_json::to_string_pretty(&projects)
        .map_err(|e| PlayerError::Storage(format!("failed to serialize manifest: {e}")))?;
    let path = root.join(MANIFEST_FILE_NAME);
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| PlayerError::Storage(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), projects = projects.len(), "manifest written");
    Ok(projects.len())
}
