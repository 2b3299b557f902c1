//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use storyloom_core::assets::AssetTransport;
use storyloom_core::manifest::ManifestSource;
use storyloom_library::directory::DirectoryLibrary;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where the project list comes from.
    pub manifest: Arc<dyn ManifestSource>,
    /// Where stories and media come from.
    pub assets: Arc<dyn AssetTransport>,
    /// Library directory rescanned by the refresh endpoint.
    pub library_root: PathBuf,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        manifest: Arc<dyn ManifestSource>,
        assets: Arc<dyn AssetTransport>,
        library_root: PathBuf,
    ) -> Self {
        Self {
            manifest,
            assets,
            library_root,
        }
    }

    /// State serving everything from one library directory.
    #[must_use]
    pub fn for_library(library: DirectoryLibrary) -> Self {
        let library_root = library.root().to_path_buf();
        let library = Arc::new(library);
        Self::new(library.clone(), library, library_root)
    }
}
