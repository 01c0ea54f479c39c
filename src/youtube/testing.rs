//! In-memory transcript source for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CaptionTrack, TranscriptError, TranscriptResult, TranscriptSegment, TranscriptSource};
use crate::BoxFuture;

/// Failure a fake track or listing produces.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    RateLimited,
    EmptyBody,
    IpBlocked,
    ServerError,
    Disabled,
}

impl Failure {
    fn error(self, video_id: &str) -> TranscriptError {
        match self {
            Self::RateLimited => TranscriptError::RateLimited {
                video_id: video_id.to_string(),
            },
            Self::EmptyBody => TranscriptError::EmptyResponse {
                video_id: video_id.to_string(),
            },
            Self::IpBlocked => TranscriptError::IpBlocked,
            Self::ServerError => TranscriptError::Status {
                status: 500,
                what: "timed text",
            },
            Self::Disabled => TranscriptError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            },
        }
    }
}

#[derive(Default)]
struct Video {
    listing_failure: Option<Failure>,
    tracks: Vec<(CaptionTrack, Result<Vec<TranscriptSegment>, Failure>)>,
}

/// Canned videos, with call counters.
#[derive(Default)]
pub(crate) struct FakeSource {
    videos: HashMap<String, Video>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

/// Five-second segments, one per text.
pub(crate) fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
    texts
        .iter()
        .zip(0u32..)
        .map(|(text, i)| TranscriptSegment {
            text: (*text).to_string(),
            start: f64::from(i) * 5.0,
            duration: 5.0,
        })
        .collect()
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(self, video_id: &str, code: &str, generated: bool, texts: &[&str]) -> Self {
        self.push(video_id, code, generated, Ok(segments(texts)))
    }

    pub fn with_failing_track(
        self,
        video_id: &str,
        code: &str,
        generated: bool,
        failure: Failure,
    ) -> Self {
        self.push(video_id, code, generated, Err(failure))
    }

    pub fn with_listing_failure(mut self, video_id: &str, failure: Failure) -> Self {
        self.videos.entry(video_id.to_string()).or_default().listing_failure = Some(failure);
        self
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn push(
        mut self,
        video_id: &str,
        code: &str,
        generated: bool,
        outcome: Result<Vec<TranscriptSegment>, Failure>,
    ) -> Self {
        let video = self.videos.entry(video_id.to_string()).or_default();
        let track = CaptionTrack {
            language_code: code.to_string(),
            language_name: format!("Language {code}"),
            is_generated: generated,
            base_url: format!("fake://{video_id}/{code}/{}", video.tracks.len()),
        };
        video.tracks.push((track, outcome));
        self
    }
}

impl TranscriptSource for FakeSource {
    fn list_tracks<'a>(
        &'a self,
        video_id: &'a str,
    ) -> BoxFuture<'a, TranscriptResult<Vec<CaptionTrack>>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let video = self.videos.get(video_id).ok_or_else(|| {
                TranscriptError::VideoUnavailable {
                    video_id: video_id.to_string(),
                    reason: "Video unavailable".to_string(),
                }
            })?;
            if let Some(failure) = video.listing_failure {
                return Err(failure.error(video_id));
            }
            Ok(video.tracks.iter().map(|(track, _)| track.clone()).collect())
        })
    }

    fn fetch_track<'a>(
        &'a self,
        video_id: &'a str,
        track: &'a CaptionTrack,
    ) -> BoxFuture<'a, TranscriptResult<Vec<TranscriptSegment>>> {
        Box::pin(async move {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .videos
                .get(video_id)
                .and_then(|v| v.tracks.iter().find(|(t, _)| t.base_url == track.base_url))
                .map(|(_, outcome)| outcome.clone())
                .ok_or_else(|| TranscriptError::parse("unknown caption track"))?;
            outcome.map_err(|failure| failure.error(video_id))
        })
    }
}
