//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use storyloom_core::assets::AssetTransport;
use storyloom_core::manifest::ManifestSource;
use storyloom_library::directory::DirectoryLibrary;
use tower::ServiceExt;
use tempfile::TempDir;

use storyloom_api::routes;
use storyloom_api::state::AppState;

/// A throwaway library directory, removed on drop.
pub struct TempLibrary {
    dir: TempDir,
}

impl TempLibrary {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    /// Adds a project folder with a compiled story.
    pub fn with_project(self, id: &str, story: &str) -> Self {
        let dir = self.path().join(id);
        fs::create_dir_all(dir.join("assets")).unwrap();
        fs::create_dir_all(dir.join("audio")).unwrap();
        fs::write(dir.join("adventure.json"), story).unwrap();
        self
    }

    /// Adds a file relative to the library root.
    pub fn with_file(self, relative: &str, bytes: &[u8]) -> Self {
        fs::write(self.path().join(relative), bytes).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Build the full app router over a library directory. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app(library: &TempLibrary) -> Router {
    routes::build_router(AppState::for_library(DirectoryLibrary::new(library.path())))
}

/// Build the app router over arbitrary manifest and asset adapters.
pub fn build_test_app_with(
    manifest: Arc<dyn ManifestSource>,
    assets: Arc<dyn AssetTransport>,
) -> Router {
    routes::build_router(AppState::new(manifest, assets, std::env::temp_dir()))
}

/// Send a request and return the status, content type and raw body.
pub async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string());
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, content_type, body_bytes.to_vec())
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send(app, "GET", uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

/// Send a POST request without a body and return the response.
pub async fn post_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send(app, "POST", uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}
