//! Errors raised before the server starts answering requests.
//!
//! Request-time failures live next to the code that produces them
//! ([`crate::youtube::TranscriptError`], [`crate::cache::CacheError`]) and
//! reach the client as tool results. Everything here ends the process.

use std::path::PathBuf;

use thiserror::Error;

use crate::mcp::registry::RegistryError;
use crate::youtube::TranscriptError;

/// A configuration file that could not be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or contains unknown keys.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An explicitly given file does not exist.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path given on the command line.
        path: PathBuf,
    },

    /// A value is out of range or inconsistent with another.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Failure while wiring the server together.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client for YouTube could not be built.
    #[error("failed to create HTTP client")]
    HttpClient(#[source] TranscriptError),

    /// Two tools share a name.
    #[error("failed to register tools")]
    Registry(#[from] RegistryError),

    /// The async runtime could not be created.
    #[error("failed to create Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_names_the_path() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/etc/yt/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("/etc/yt/config.json"));
    }

    #[test]
    fn config_errors_pass_through_startup() {
        let error: StartupError = ConfigError::ValidationError {
            message: "retry.max_attempts must be at least 1".to_string(),
        }
        .into();
        assert!(error.to_string().contains("retry.max_attempts"));
    }

    #[test]
    fn registry_error_is_the_source() {
        let error: StartupError = RegistryError::Duplicate("get_transcript".to_string()).into();
        assert_eq!(error.to_string(), "failed to register tools");
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Tool already registered: get_transcript"));
    }
}
