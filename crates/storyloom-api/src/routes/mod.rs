//! HTTP routes.

pub mod assets;
pub mod health;
pub mod projects;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the player's origin once it is deployed separately.
    Router::new()
        .merge(health::router())
        .nest(
            "/api/v1/projects",
            projects::router().merge(assets::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
