//! On-disk transcript cache.
//!
//! Each transcript is stored as pretty-printed JSON in its own file, named by
//! the SHA-256 of the video id. A metadata index (`cache_metadata.json`)
//! records when and how large each entry is:
//!
//! ```text
//! ~/.youtube_mcp_cache/
//! ├── cache_metadata.json
//! ├── 3f5c...e1.json
//! └── 9a02...7b.json
//! ```
//!
//! Entries older than `max_age` are dropped on read. After every insert the
//! oldest entries are evicted until the cache fits in `max_size_bytes`.
//! A missing or corrupt index is treated as empty.

mod error;

pub use error::{CacheError, CacheResult};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{self, CacheConfig};
use crate::youtube::Transcript;

/// File name of the metadata index inside the cache directory.
pub const METADATA_FILE: &str = "cache_metadata.json";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Settings needed to open a cache. Resolving them does no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Cache directory; `None` means `~/.youtube_mcp_cache`.
    pub directory: Option<PathBuf>,
    /// Maximum entry age in hours.
    pub max_age_hours: u64,
    /// Maximum total size of cached transcripts in bytes.
    pub max_size_bytes: u64,
}

impl CacheSettings {
    /// Builds settings from the configuration, with an optional directory override.
    ///
    /// A relative directory is resolved against the home directory.
    #[must_use]
    pub fn from_config(cfg: &CacheConfig, directory_override: Option<PathBuf>) -> Self {
        Self {
            directory: directory_override
                .or_else(|| cfg.directory.clone())
                .and_then(config::resolve_cache_dir),
            max_age_hours: cfg.max_age_hours,
            max_size_bytes: cfg.max_size_mb.saturating_mul(BYTES_PER_MB),
        }
    }
}

/// One row of the metadata index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataEntry {
    video_id: String,
    /// RFC 3339, UTC.
    timestamp: String,
    size: u64,
}

impl MetadataEntry {
    fn cached_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

type Metadata = BTreeMap<String, MetadataEntry>;

/// Summary returned by [`TranscriptCache::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of cached videos.
    pub total_videos: usize,
    /// Total size of cached transcripts, rounded to two decimals.
    pub total_size_mb: f64,
    /// Configured size limit.
    pub max_size_mb: f64,
    /// Cache directory.
    pub cache_dir: PathBuf,
    /// Configured expiry.
    pub max_age_hours: u64,
}

/// The transcript cache.
#[derive(Debug)]
pub struct TranscriptCache {
    dir: PathBuf,
    metadata_file: PathBuf,
    max_age_hours: u64,
    max_size_bytes: u64,
}

impl TranscriptCache {
    /// Opens the cache, creating the directory and an empty index if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be determined or created, or
    /// the index cannot be written.
    pub fn open(settings: &CacheSettings) -> CacheResult<Self> {
        let dir = match &settings.directory {
            Some(dir) => dir.clone(),
            None => config::default_cache_dir().ok_or(CacheError::NoHomeDirectory)?,
        };

        fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let cache = Self {
            metadata_file: dir.join(METADATA_FILE),
            dir,
            max_age_hours: settings.max_age_hours,
            max_size_bytes: settings.max_size_bytes,
        };

        if !cache.metadata_file.exists() {
            cache.save_metadata(&Metadata::new())?;
        }

        tracing::info!(cache_dir = %cache.dir.display(), "Transcript cache opened");
        Ok(cache)
    }

    /// The cache directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn cache_key(video_id: &str) -> String {
        format!("{:x}", Sha256::digest(video_id.as_bytes()))
    }

    fn cache_path(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::cache_key(video_id)))
    }

    fn load_metadata(&self) -> Metadata {
        let Ok(contents) = fs::read_to_string(&self.metadata_file) else {
            return Metadata::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Cache metadata is corrupt, starting fresh");
            Metadata::new()
        })
    }

    fn save_metadata(&self, metadata: &Metadata) -> CacheResult<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&self.metadata_file, json).map_err(|source| CacheError::Write {
            path: self.metadata_file.clone(),
            source,
        })
    }

    fn is_expired(&self, entry: &MetadataEntry, now: DateTime<Utc>) -> bool {
        let max_age_secs = i64::try_from(self.max_age_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        entry
            .cached_at()
            .is_some_and(|cached| (now - cached).num_seconds() > max_age_secs)
    }

    /// Returns the cached transcript if present and not expired.
    ///
    /// Expired or unreadable entries are removed.
    #[must_use]
    pub fn get(&self, video_id: &str) -> Option<Transcript> {
        let path = self.cache_path(video_id);
        if !path.exists() {
            tracing::debug!(video_id, "Cache miss");
            return None;
        }

        let metadata = self.load_metadata();
        if let Some(entry) = metadata.get(&Self::cache_key(video_id)) {
            if self.is_expired(entry, Utc::now()) {
                tracing::debug!(video_id, "Cache entry expired");
                self.delete_quietly(video_id);
                return None;
            }
        }

        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Transcript>(&s).map_err(|e| e.to_string()));

        match parsed {
            Ok(transcript) => {
                tracing::debug!(video_id, "Cache hit");
                Some(transcript)
            }
            Err(e) => {
                tracing::error!(video_id, error = %e, "Error reading cache entry");
                self.delete_quietly(video_id);
                None
            }
        }
    }

    /// Stores a transcript, then evicts old entries if the cache is too large.
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript or the index cannot be written.
    pub fn set(&self, transcript: &Transcript) -> CacheResult<()> {
        self.set_at(transcript, Utc::now())
    }

    /// Stores a transcript with an explicit cache timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript or the index cannot be written.
    pub fn set_at(&self, transcript: &Transcript, cached_at: DateTime<Utc>) -> CacheResult<()> {
        let video_id = transcript.video_id.as_str();
        let path = self.cache_path(video_id);

        let json = serde_json::to_string_pretty(transcript)?;
        fs::write(&path, &json).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        let size = fs::metadata(&path).map_or(json.len() as u64, |m| m.len());

        let mut metadata = self.load_metadata();
        metadata.insert(
            Self::cache_key(video_id),
            MetadataEntry {
                video_id: video_id.to_string(),
                timestamp: cached_at.to_rfc3339(),
                size,
            },
        );

        self.evict_oversize(&mut metadata)?;
        self.save_metadata(&metadata)?;

        tracing::debug!(video_id, size, "Cached transcript");
        Ok(())
    }

    /// Removes the oldest entries until the total size fits the limit.
    fn evict_oversize(&self, metadata: &mut Metadata) -> CacheResult<()> {
        let mut total: u64 = metadata.values().map(|e| e.size).sum();
        if total <= self.max_size_bytes {
            return Ok(());
        }

        let mut by_age: Vec<(String, Option<DateTime<Utc>>)> = metadata
            .iter()
            .map(|(key, entry)| (key.clone(), entry.cached_at()))
            .collect();
        // Unparseable timestamps sort first and go first.
        by_age.sort_by(|a, b| a.1.cmp(&b.1));

        for (key, _) in by_age {
            if total <= self.max_size_bytes {
                break;
            }
            if let Some(entry) = metadata.remove(&key) {
                self.remove_file(&self.dir.join(format!("{key}.json")))?;
                total = total.saturating_sub(entry.size);
                tracing::debug!(video_id = %entry.video_id, "Removed from cache to free space");
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> CacheResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Deletes one video from the cache.
    ///
    /// Returns `true` if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be removed or the index cannot be written.
    pub fn delete(&self, video_id: &str) -> CacheResult<bool> {
        let path = self.cache_path(video_id);
        let existed = path.exists();
        self.remove_file(&path)?;

        let mut metadata = self.load_metadata();
        let indexed = metadata.remove(&Self::cache_key(video_id)).is_some();
        if indexed {
            self.save_metadata(&metadata)?;
        }
        Ok(existed || indexed)
    }

    fn delete_quietly(&self, video_id: &str) {
        if let Err(e) = self.delete(video_id) {
            tracing::warn!(video_id, error = %e, "Failed to delete cache entry");
        }
    }

    /// Removes every cached transcript.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed, a file cannot be
    /// removed or the index cannot be written.
    pub fn clear(&self) -> CacheResult<usize> {
        let entries = fs::read_dir(&self.dir).map_err(|source| CacheError::Read {
            path: self.dir.clone(),
            source,
        })?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if is_json && path != self.metadata_file {
                self.remove_file(&path)?;
                removed += 1;
            }
        }

        self.save_metadata(&Metadata::new())?;
        tracing::info!(removed, "Cache cleared");
        Ok(removed)
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let metadata = self.load_metadata();
        let total_size: u64 = metadata.values().map(|e| e.size).sum();
        let total_mb = total_size as f64 / BYTES_PER_MB as f64;

        CacheStats {
            total_videos: metadata.len(),
            total_size_mb: (total_mb * 100.0).round() / 100.0,
            max_size_mb: self.max_size_bytes as f64 / BYTES_PER_MB as f64,
            cache_dir: self.dir.clone(),
            max_age_hours: self.max_age_hours,
        }
    }
}
