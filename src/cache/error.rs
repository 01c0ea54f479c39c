//! Error types for the transcript cache.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No cache directory was configured and the home directory is unknown.
    #[error("Cannot determine home directory for the transcript cache")]
    NoHomeDirectory,

    /// Failed to create the cache directory.
    #[error("Failed to create cache directory: {path}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to read a cache file.
    #[error("Failed to read cache file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write a cache file.
    #[error("Failed to write cache file: {path}")]
    Write {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to remove a cache file.
    #[error("Failed to remove cache file: {path}")]
    Remove {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Cache content could not be serialised.
    #[error("Failed to serialise cache data: {0}")]
    Serialise(#[from] serde_json::Error),
}

impl CacheError {
    /// A message for the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoHomeDirectory => format!(
                "{self}. Set cache.directory in the configuration file or pass --cache-dir."
            ),
            Self::CreateDir { .. } | Self::Write { .. } | Self::Remove { .. } => {
                format!("{self}. Check that the cache directory is writable.")
            }
            Self::Read { .. } | Self::Serialise(_) => self.to_string(),
        }
    }
}
