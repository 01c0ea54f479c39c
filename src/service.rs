//! Transcript retrieval with caching.
//!
//! [`TranscriptService`] is the state shared by all tools. The cache is held
//! in a [`Lazy`] so it is only created when a tool first needs it. Cache
//! failures never fail a fetch: the transcript is fetched and returned
//! without being stored.

use std::sync::Arc;

use crate::cache::{CacheError, CacheSettings, CacheStats, TranscriptCache};
use crate::lazy::Lazy;
use crate::retry::RetryPolicy;
use crate::youtube::{
    CaptionTrack, Transcript, TranscriptFetcher, TranscriptResult, TranscriptSource,
};

/// Shared transcript state: fetcher plus lazily opened cache.
pub struct TranscriptService {
    fetcher: TranscriptFetcher,
    cache: Lazy<TranscriptCache, CacheError>,
}

impl TranscriptService {
    /// Creates the service. No filesystem access happens here.
    #[must_use]
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        retry: RetryPolicy,
        languages: Vec<String>,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            fetcher: TranscriptFetcher::new(source, retry, languages),
            cache: Lazy::new(move || TranscriptCache::open(&cache_settings)),
        }
    }

    /// Whether the cache has been opened yet.
    #[must_use]
    pub fn cache_initialised(&self) -> bool {
        self.cache.is_initialised()
    }

    /// Returns the cache, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be opened.
    pub async fn cache(&self) -> Result<&TranscriptCache, CacheError> {
        self.cache.get().await
    }

    /// Returns a transcript, from the cache when allowed and available.
    ///
    /// With `use_cache` set to `false` the cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript has to be fetched and fetching fails.
    pub async fn transcript(
        &self,
        video_id: &str,
        use_cache: bool,
        language: Option<&str>,
    ) -> TranscriptResult<Transcript> {
        if !use_cache {
            tracing::info!(video_id, "Fetching fresh transcript, cache bypassed");
            return self.fetcher.fetch(video_id, language).await;
        }

        let cache = match self.cache.get().await {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!(error = %e, "Transcript cache unavailable, fetching without it");
                None
            }
        };

        if let Some(hit) = cache.and_then(|c| c.get(video_id)) {
            if language.map_or(true, |lang| hit.serves_language(lang)) {
                tracing::info!(video_id, "Cache hit");
                return Ok(hit);
            }
            tracing::debug!(video_id, "Cached transcript is in another language, refetching");
        }

        tracing::info!(video_id, "Fetching transcript from YouTube");
        let transcript = self.fetcher.fetch(video_id, language).await?;

        if let Some(cache) = cache {
            if let Err(e) = cache.set(&transcript) {
                tracing::warn!(video_id, error = %e, "Failed to cache transcript");
            }
        }
        Ok(transcript)
    }

    /// Lists caption tracks without touching the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the track list cannot be retrieved.
    pub async fn caption_tracks(&self, video_id: &str) -> TranscriptResult<Vec<CaptionTrack>> {
        self.fetcher.list_tracks(video_id).await
    }

    /// Cache statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be opened.
    pub async fn cache_stats(&self) -> Result<CacheStats, CacheError> {
        Ok(self.cache.get().await?.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::testing::FakeSource;
    use tempfile::TempDir;

    fn service(source: &Arc<FakeSource>, directory: std::path::PathBuf) -> TranscriptService {
        TranscriptService::new(
            source.clone(),
            RetryPolicy::immediate(1),
            vec!["en".to_string()],
            CacheSettings {
                directory: Some(directory),
                max_age_hours: 24,
                max_size_bytes: 1024 * 1024,
            },
        )
    }

    fn source() -> Arc<FakeSource> {
        Arc::new(
            FakeSource::new()
                .with_track("vid", "en", false, &["hello world"])
                .with_track("vid", "de", false, &["hallo welt"]),
        )
    }

    #[tokio::test]
    async fn cache_is_opened_lazily() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let service = service(&source(), cache_dir.clone());

        assert!(!service.cache_initialised());
        assert!(!cache_dir.exists());

        service.transcript("vid", true, None).await.unwrap();
        assert!(service.cache_initialised());
        assert!(cache_dir.exists());
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let source = source();
        let service = service(&source, dir.path().to_path_buf());

        let first = service.transcript("vid", true, None).await.unwrap();
        let second = service.transcript("vid", true, None).await.unwrap();

        assert_eq!(first.full_transcript, second.full_transcript);
        assert_eq!(source.list_count(), 1);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn bypass_neither_reads_nor_writes_cache() {
        let dir = TempDir::new().unwrap();
        let source = source();
        let service = service(&source, dir.path().to_path_buf());

        service.transcript("vid", false, None).await.unwrap();
        assert!(!service.cache_initialised());

        service.transcript("vid", true, None).await.unwrap();
        service.transcript("vid", false, None).await.unwrap();
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn cached_transcript_in_other_language_is_refetched() {
        let dir = TempDir::new().unwrap();
        let source = source();
        let service = service(&source, dir.path().to_path_buf());

        service.transcript("vid", true, None).await.unwrap();
        let german = service.transcript("vid", true, Some("de")).await.unwrap();

        assert_eq!(german.full_transcript, "hallo welt");
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn regional_and_missing_languages_reuse_cache() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new().with_track("vid", "en-GB", false, &["cheerio"]));
        let service = service(&source, dir.path().to_path_buf());

        for _ in 0..3 {
            let t = service.transcript("vid", true, Some("en")).await.unwrap();
            assert_eq!(t.language.as_deref(), Some("en-GB"));
        }
        for _ in 0..3 {
            let t = service.transcript("vid", true, Some("fr")).await.unwrap();
            assert_eq!(t.full_transcript, "cheerio");
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn broken_cache_does_not_fail_fetch() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let service = service(&source(), blocker.join("cache"));

        let transcript = service.transcript("vid", true, None).await.unwrap();
        assert_eq!(transcript.full_transcript, "hello world");
        assert!(service.cache_stats().await.is_err());
    }

    #[tokio::test]
    async fn caption_tracks_skip_cache() {
        let dir = TempDir::new().unwrap();
        let service = service(&source(), dir.path().join("cache"));

        let tracks = service.caption_tracks("vid").await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(!service.cache_initialised());
    }
}
