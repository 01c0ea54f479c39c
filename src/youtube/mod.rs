//! YouTube transcript retrieval.
//!
//! - [`extract_video_id`] turns the many YouTube URL shapes into a video id
//! - [`TranscriptSource`] abstracts the network: list caption tracks, fetch one
//! - [`YouTubeClient`] is the real source, talking to youtube.com with `reqwest`
//! - [`TranscriptFetcher`] picks a track, falls back across tracks and wraps
//!   every request in the retry policy

mod client;
mod error;
mod fetcher;
#[cfg(test)]
pub(crate) mod testing;

pub use client::YouTubeClient;
pub use error::{TranscriptError, TranscriptResult};
pub use fetcher::TranscriptFetcher;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::BoxFuture;

/// One timed piece of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// Display duration in seconds.
    pub duration: f64,
}

/// A complete transcript as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// YouTube video id.
    pub video_id: String,
    /// Language code of the caption track, when known.
    #[serde(default)]
    pub language: Option<String>,
    /// Timed segments in playback order.
    #[serde(rename = "transcript_segments")]
    pub segments: Vec<TranscriptSegment>,
    /// All segment texts joined by single spaces.
    pub full_transcript: String,
    /// End of the last segment, in seconds.
    pub duration_seconds: f64,
    /// Whole minutes of `duration_seconds`.
    pub duration_minutes: u64,
    /// Unix timestamp of the download.
    pub fetched_at: i64,
    /// Language codes of every caption track listed when this was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_languages: Option<Vec<String>>,
}

impl Transcript {
    /// Builds a transcript from downloaded segments.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_segments(
        video_id: impl Into<String>,
        language: Option<String>,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        let duration_seconds = segments
            .last()
            .map_or(0.0, |last| last.start + last.duration);
        let full_transcript = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            video_id: video_id.into(),
            language,
            segments,
            full_transcript,
            duration_seconds,
            duration_minutes: (duration_seconds / 60.0).max(0.0) as u64,
            fetched_at: chrono::Utc::now().timestamp(),
            available_languages: None,
        }
    }

    /// Whether this transcript answers a request for `language`.
    ///
    /// That holds when it is in that language (or a regional variant of it),
    /// or when the video had no track in that language at fetch time, so a
    /// fresh fetch would fall back as well.
    #[must_use]
    pub fn serves_language(&self, language: &str) -> bool {
        let Some(have) = self.language.as_deref() else {
            return true;
        };
        if language_matches(have, language) {
            return true;
        }
        self.available_languages
            .as_ref()
            .is_some_and(|codes| !codes.iter().any(|code| language_matches(code, language)))
    }

    /// Returns `true` if there is no text to work with.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.full_transcript.trim().is_empty()
    }
}

/// A caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    /// BCP-47 style language code, e.g. `en` or `pt-BR`.
    pub language_code: String,
    /// Human readable language name.
    pub language_name: String,
    /// Whether the track was produced by automatic speech recognition.
    pub is_generated: bool,
    /// URL of the timed-text document.
    pub base_url: String,
}

impl CaptionTrack {
    /// `manual` or `auto-generated`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        if self.is_generated {
            "auto-generated"
        } else {
            "manual"
        }
    }
}

/// Where transcripts come from.
///
/// The fetch logic is written against this trait so it can run without the
/// network.
pub trait TranscriptSource: Send + Sync {
    /// Lists the caption tracks available for a video.
    fn list_tracks<'a>(&'a self, video_id: &'a str)
        -> BoxFuture<'a, TranscriptResult<Vec<CaptionTrack>>>;

    /// Downloads one caption track.
    fn fetch_track<'a>(
        &'a self,
        video_id: &'a str,
        track: &'a CaptionTrack,
    ) -> BoxFuture<'a, TranscriptResult<Vec<TranscriptSegment>>>;
}

/// Whether a track's language code satisfies a requested language.
///
/// Comparison ignores ASCII case, and a base code such as `en` also accepts
/// regional variants like `en-GB`.
#[must_use]
pub fn language_matches(code: &str, preference: &str) -> bool {
    if code.eq_ignore_ascii_case(preference) {
        return true;
    }
    code.as_bytes().get(preference.len()) == Some(&b'-')
        && code
            .get(..preference.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(preference))
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([^&?#/\s]+)",
        )
        .expect("video URL pattern is valid")
    })
}

fn bare_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"))
}

/// Extracts the video id from a YouTube URL or a bare 11-character id.
///
/// # Errors
///
/// Returns [`TranscriptError::InvalidUrl`] if no id can be found.
pub fn extract_video_id(url: &str) -> TranscriptResult<String> {
    let trimmed = url.trim();

    if let Some(id) = url_pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
    {
        return Ok(id.as_str().to_string());
    }

    if bare_id_pattern().is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(TranscriptError::InvalidUrl {
        url: url.to_string(),
    })
}
