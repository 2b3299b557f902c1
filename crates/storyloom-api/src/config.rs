//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

/// Runtime configuration of the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Port to bind (`PORT`, default `3000`).
    pub port: u16,
    /// Story library root (`STORYLOOM_LIBRARY_DIR`, default `data/output`).
    pub library_dir: PathBuf,
    /// Rescan the library and rewrite its manifest on start
    /// (`STORYLOOM_REFRESH_MANIFEST`, default `true`).
    pub refresh_manifest: bool,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let library_dir = lookup("STORYLOOM_LIBRARY_DIR")
            .map_or_else(|| PathBuf::from("data/output"), PathBuf::from);
        let refresh_manifest = match lookup("STORYLOOM_REFRESH_MANIFEST").as_deref() {
            None => true,
            Some(value) => parse_flag(value).ok_or_else(|| {
                AppError::Config(format!(
                    "STORYLOOM_REFRESH_MANIFEST must be true or false, got {value:?}"
                ))
            })?,
        };
        Ok(Self {
            host,
            port,
            library_dir,
            refresh_manifest,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host` is not an IP address.
    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
