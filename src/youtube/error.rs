//! Error types for transcript retrieval.

use thiserror::Error;

use crate::retry::Retryable;

/// Result type for transcript operations.
pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Errors that can occur while locating or downloading a transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// The input could not be turned into a video id.
    #[error("Could not extract video ID from URL: {url}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },

    /// YouTube answered with HTTP 429.
    #[error("YouTube is rate limiting requests (HTTP 429) for video {video_id}")]
    RateLimited {
        /// Video being fetched.
        video_id: String,
    },

    /// YouTube served a captcha page instead of content.
    #[error("YouTube is blocking requests from this IP address (captcha required)")]
    IpBlocked,

    /// An endpoint returned an empty body.
    #[error("YouTube returned an empty response for video {video_id}")]
    EmptyResponse {
        /// Video being fetched.
        video_id: String,
    },

    /// The video cannot be played (private, removed, region locked, ...).
    #[error("Video {video_id} is unavailable: {reason}")]
    VideoUnavailable {
        /// Video being fetched.
        video_id: String,
        /// Reason reported by YouTube.
        reason: String,
    },

    /// The video has no caption tracks at all.
    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled {
        /// Video being fetched.
        video_id: String,
    },

    /// Every caption track failed to download.
    #[error("No transcript could be retrieved for video {video_id}")]
    NoTranscriptFound {
        /// Video being fetched.
        video_id: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected HTTP status other than 429.
    #[error("YouTube returned HTTP {status} for {what}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Which request failed.
        what: &'static str,
    },

    /// A response did not have the expected shape.
    #[error("Failed to parse YouTube response: {message}")]
    Parse {
        /// Description of what's wrong.
        message: String,
    },
}

impl TranscriptError {
    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// A message for the end user that names the likely cause.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUrl { .. } => format!(
                "Invalid YouTube URL: {self}. Use a link such as \
                 https://www.youtube.com/watch?v=VIDEO_ID or https://youtu.be/VIDEO_ID."
            ),
            Self::RateLimited { .. } | Self::IpBlocked => format!(
                "{self}. YouTube is limiting requests from this machine; \
                 wait a few minutes and try again."
            ),
            Self::EmptyResponse { video_id } => format!(
                "YouTube returned empty response. The video may not have captions available, \
                 may be private, or YouTube may be temporarily blocking requests. \
                 Video ID: {video_id}"
            ),
            Self::VideoUnavailable { .. } => format!(
                "{self}. The video may be private, deleted, age-restricted or not \
                 available in this region."
            ),
            Self::TranscriptsDisabled { .. } | Self::NoTranscriptFound { .. } => format!(
                "{self}. The uploader may not have provided captions and automatic \
                 captions may be unavailable for this video."
            ),
            Self::Http(_) | Self::Status { .. } => format!(
                "Could not retrieve transcript: {self}. Check the network connection \
                 and try again."
            ),
            Self::Parse { .. } => format!(
                "Could not retrieve transcript: {self}. YouTube may have changed its \
                 page format."
            ),
        }
    }
}

impl Retryable for TranscriptError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::EmptyResponse { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidUrl { .. }
            | Self::IpBlocked
            | Self::VideoUnavailable { .. }
            | Self::TranscriptsDisabled { .. }
            | Self::NoTranscriptFound { .. }
            | Self::Parse { .. } => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        // An empty body is how throttling usually shows up on the timed-text endpoint.
        matches!(self, Self::RateLimited { .. } | Self::EmptyResponse { .. })
    }
}
