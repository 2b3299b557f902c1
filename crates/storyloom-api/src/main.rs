//! Storyloom API server entry point.

use storyloom_api::config::AppConfig;
use storyloom_api::error::AppError;
use storyloom_api::routes;
use storyloom_api::state::AppState;
use storyloom_library::directory::DirectoryLibrary;
use storyloom_library::manifest::write_manifest;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Storyloom API server");

    let config = AppConfig::from_env()?;
    let addr = config.addr()?;

    if config.refresh_manifest {
        match write_manifest(&config.library_dir).await {
            Ok(projects) => tracing::info!(projects, "manifest refreshed on start"),
            Err(e) => tracing::warn!(error = %e, "could not refresh manifest; serving the existing one"),
        }
    }

    let app_state = AppState::for_library(DirectoryLibrary::new(&config.library_dir));
    let app = routes::build_router(app_state);

    tracing::info!(library = %config.library_dir.display(), "Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
