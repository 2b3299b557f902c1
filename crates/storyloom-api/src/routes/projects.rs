//! Routes for the project list.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use storyloom_core::manifest::ProjectEntry;
use storyloom_library::manifest::write_manifest;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Number of projects now listed in the manifest.
    pub projects: usize,
}

/// GET /
#[instrument(skip(state))]
async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectEntry>>, ApiError> {
    let projects = state.manifest.load_manifest().await?;
    Ok(Json(projects))
}

/// POST /refresh
#[instrument(skip(state), fields(root = %state.library_root.display()))]
async fn refresh_manifest(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let projects = write_manifest(&state.library_root).await?;
    info!(projects, "manifest refreshed");
    Ok(Json(RefreshResponse { projects }))
}

/// Returns the router for the project list.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/refresh", post(refresh_manifest))
}
