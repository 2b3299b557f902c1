//! Routes serving a project's compiled story and media.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use storyloom_core::assets::AssetKind;
use storyloom_library::directory::validate_segment;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Content type for a media file, chosen by extension.
#[must_use]
pub fn content_type_for(file: &str) -> &'static str {
    let extension = file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// GET /{id}/adventure.json
#[instrument(skip(state))]
async fn story(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_segment(&project_id)?;
    let story = state.assets.fetch_story(&project_id).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], story))
}

async fn media(
    state: &AppState,
    project_id: &str,
    kind: AssetKind,
    file: &str,
) -> Result<Response, ApiError> {
    validate_segment(project_id)?;
    validate_segment(file)?;
    let bytes = state.assets.fetch_asset(project_id, kind, file).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(file))], bytes).into_response())
}

/// GET /{id}/assets/{file}
#[instrument(skip(state))]
async fn image(
    State(state): State<AppState>,
    Path((project_id, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    media(&state, &project_id, AssetKind::Image, &file).await
}

/// GET /{id}/audio/{file}
#[instrument(skip(state))]
async fn audio(
    State(state): State<AppState>,
    Path((project_id, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    media(&state, &project_id, AssetKind::Audio, &file).await
}

/// Returns the router for project files.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/adventure.json", get(story))
        .route("/{id}/assets/{file}", get(image))
        .route("/{id}/audio/{file}", get(audio))
}
