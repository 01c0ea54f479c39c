//! Track selection and language fallback.

use std::sync::Arc;

use super::{
    language_matches, CaptionTrack, Transcript, TranscriptError, TranscriptResult,
    TranscriptSource,
};
use crate::retry::RetryPolicy;

/// Downloads transcripts through a [`TranscriptSource`].
///
/// Tracks are tried in preference order: each preferred language with manual
/// captions before auto-generated ones, then every remaining track in the
/// order YouTube lists them. The first track that yields text wins.
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    retry: RetryPolicy,
    languages: Vec<String>,
}

impl TranscriptFetcher {
    /// Creates a fetcher with the given preferred languages.
    #[must_use]
    pub fn new(source: Arc<dyn TranscriptSource>, retry: RetryPolicy, languages: Vec<String>) -> Self {
        Self {
            source,
            retry,
            languages,
        }
    }

    /// Lists the caption tracks of a video.
    ///
    /// # Errors
    ///
    /// Returns the source's error once retries are exhausted.
    pub async fn list_tracks(&self, video_id: &str) -> TranscriptResult<Vec<CaptionTrack>> {
        self.retry
            .run("list caption tracks", || self.source.list_tracks(video_id))
            .await
    }

    /// Fetches the best available transcript for a video.
    ///
    /// `language` takes precedence over the configured languages.
    ///
    /// # Errors
    ///
    /// Returns an error if no track could be listed or downloaded.
    pub async fn fetch(&self, video_id: &str, language: Option<&str>) -> TranscriptResult<Transcript> {
        let tracks = self.list_tracks(video_id).await?;
        let available: Vec<String> = tracks.iter().map(|t| t.language_code.clone()).collect();

        let mut preferences: Vec<&str> = Vec::with_capacity(self.languages.len() + 1);
        if let Some(lang) = language {
            preferences.push(lang);
        }
        preferences.extend(self.languages.iter().map(String::as_str));

        let ordered = order_tracks(tracks, &preferences);
        let mut last_error = None;

        for track in &ordered {
            let result = self
                .retry
                .run("fetch caption track", || self.source.fetch_track(video_id, track))
                .await;

            match result {
                Ok(segments) if !segments.is_empty() => {
                    tracing::info!(
                        video_id,
                        language = %track.language_code,
                        kind = track.kind(),
                        segments = segments.len(),
                        "Fetched transcript"
                    );
                    let mut transcript = Transcript::from_segments(
                        video_id,
                        Some(track.language_code.clone()),
                        segments,
                    );
                    transcript.available_languages = Some(available);
                    return Ok(transcript);
                }
                Ok(_) => {
                    tracing::warn!(video_id, language = %track.language_code, "Caption track is empty");
                    last_error = Some(TranscriptError::EmptyResponse {
                        video_id: video_id.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        video_id,
                        language = %track.language_code,
                        error = %e,
                        "Failed to fetch caption track"
                    );
                    // Trying more tracks would only deepen the block.
                    if matches!(e, TranscriptError::IpBlocked) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TranscriptError::NoTranscriptFound {
            video_id: video_id.to_string(),
        }))
    }
}

/// Sorts tracks by language preference, manual before auto-generated.
///
/// Tracks matching no preference keep their original relative order at the end.
pub(crate) fn order_tracks(mut tracks: Vec<CaptionTrack>, preferences: &[&str]) -> Vec<CaptionTrack> {
    tracks.sort_by_key(|track| {
        preferences
            .iter()
            .position(|pref| language_matches(&track.language_code, pref))
            .map_or((usize::MAX, false), |pos| (pos, track.is_generated))
    });
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::testing::{Failure, FakeSource};

    fn track(code: &str, generated: bool) -> CaptionTrack {
        CaptionTrack {
            language_code: code.to_string(),
            language_name: code.to_string(),
            is_generated: generated,
            base_url: format!("https://example.invalid/{code}"),
        }
    }

    fn codes(tracks: &[CaptionTrack]) -> Vec<(String, bool)> {
        tracks
            .iter()
            .map(|t| (t.language_code.clone(), t.is_generated))
            .collect()
    }

    #[test]
    fn preferred_language_first_manual_before_generated() {
        let tracks = vec![track("de", false), track("en", true), track("en", false)];
        let ordered = order_tracks(tracks, &["en"]);
        assert_eq!(
            codes(&ordered),
            vec![
                ("en".to_string(), false),
                ("en".to_string(), true),
                ("de".to_string(), false)
            ]
        );
    }

    #[test]
    fn unmatched_tracks_keep_order() {
        let tracks = vec![track("fr", false), track("ja", true), track("de", false)];
        let ordered = order_tracks(tracks, &["de"]);
        assert_eq!(
            codes(&ordered),
            vec![
                ("de".to_string(), false),
                ("fr".to_string(), false),
                ("ja".to_string(), true)
            ]
        );
    }

    fn fetcher(source: FakeSource, languages: &[&str]) -> (Arc<FakeSource>, TranscriptFetcher) {
        let source = Arc::new(source);
        let fetcher = TranscriptFetcher::new(
            source.clone(),
            RetryPolicy::immediate(3),
            languages.iter().map(|l| (*l).to_string()).collect(),
        );
        (source, fetcher)
    }

    #[tokio::test]
    async fn explicit_language_beats_configured_languages() {
        let source = FakeSource::new()
            .with_track("vid", "en", false, &["hello"])
            .with_track("vid", "de", false, &["hallo"]);
        let (_, fetcher) = fetcher(source, &["en"]);

        let transcript = fetcher.fetch("vid", Some("de")).await.unwrap();
        assert_eq!(transcript.language.as_deref(), Some("de"));
        assert_eq!(transcript.full_transcript, "hallo");
        assert_eq!(
            transcript.available_languages,
            Some(vec!["en".to_string(), "de".to_string()])
        );
    }

    #[tokio::test]
    async fn falls_back_to_next_track_after_failure() {
        let source = FakeSource::new()
            .with_failing_track("vid", "en", false, Failure::ServerError)
            .with_track("vid", "en", true, &["from", "asr"]);
        let (source, fetcher) = fetcher(source, &["en"]);

        let transcript = fetcher.fetch("vid", None).await.unwrap();
        assert_eq!(transcript.full_transcript, "from asr");
        // Three attempts on the broken track, one on the good one.
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn rate_limited_track_falls_back_to_next() {
        let source = FakeSource::new()
            .with_failing_track("vid", "en", false, Failure::RateLimited)
            .with_track("vid", "fr", false, &["bonjour"]);
        let (source, fetcher) = fetcher(source, &["en"]);

        let transcript = fetcher.fetch("vid", None).await.unwrap();
        assert_eq!(transcript.full_transcript, "bonjour");
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn empty_body_falls_back_to_next() {
        let source = FakeSource::new()
            .with_failing_track("vid", "en", false, Failure::EmptyBody)
            .with_track("vid", "de", true, &["hallo"]);
        let (source, fetcher) = fetcher(source, &["en"]);

        let transcript = fetcher.fetch("vid", None).await.unwrap();
        assert_eq!(transcript.language.as_deref(), Some("de"));
        assert_eq!(transcript.full_transcript, "hallo");
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn ip_block_stops_fallback() {
        let source = FakeSource::new()
            .with_failing_track("vid", "en", false, Failure::IpBlocked)
            .with_track("vid", "fr", false, &["bonjour"]);
        let (source, fetcher) = fetcher(source, &["en"]);

        let err = fetcher.fetch("vid", None).await.unwrap_err();
        assert!(matches!(err, TranscriptError::IpBlocked));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn every_track_empty_reports_last_error() {
        let source = FakeSource::new()
            .with_failing_track("vid", "en", false, Failure::EmptyBody)
            .with_failing_track("vid", "fr", false, Failure::EmptyBody);
        let (_, fetcher) = fetcher(source, &["en"]);

        let err = fetcher.fetch("vid", None).await.unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn empty_tracks_report_empty_response() {
        let source = FakeSource::new().with_track("vid", "en", false, &[]);
        let (_, fetcher) = fetcher(source, &["en"]);

        let err = fetcher.fetch("vid", None).await.unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn listing_errors_are_not_retried_when_permanent() {
        let source = FakeSource::new().with_listing_failure("vid", Failure::Disabled);
        let (source, fetcher) = fetcher(source, &["en"]);

        let err = fetcher.fetch("vid", None).await.unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptsDisabled { .. }));
        assert_eq!(source.list_count(), 1);
        assert_eq!(source.fetch_count(), 0);
    }
}
