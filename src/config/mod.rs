//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the first CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.youtube-transcript-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.youtube-transcript-mcp\config.json`
//!
//! Every setting has a default, so a missing file at the default location is
//! not an error.
//!
//! # Example Configuration
//!
//! See `config/example-config.json` for a complete example.

mod settings;

pub use settings::{CacheConfig, Config, LoggingConfig, RetryConfig, YouTubeConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the cache directory created in the user's home directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".youtube_mcp_cache";

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.youtube-transcript-mcp/`
/// - **Windows:** `%USERPROFILE%\.youtube-transcript-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".youtube-transcript-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Returns the default cache directory, `~/.youtube_mcp_cache`.
///
/// The cache always lives under the home directory so the server works
/// regardless of the working directory the client launches it from.
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(DEFAULT_CACHE_DIR_NAME))
}

/// Anchors a configured cache directory.
///
/// Absolute paths are kept. Relative paths are taken relative to the home
/// directory, never the working directory the client happened to start the
/// server in. Returns `None` for a relative path when there is no home
/// directory.
#[must_use]
pub fn resolve_cache_dir(path: PathBuf) -> Option<PathBuf> {
    if path.is_absolute() {
        Some(path)
    } else {
        dirs::home_dir().map(|home| home.join(path))
    }
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location and falls
/// back to built-in defaults when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
