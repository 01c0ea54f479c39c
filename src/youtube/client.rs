//! HTTP client for YouTube caption tracks.
//!
//! Caption discovery goes through the Innertube player endpoint:
//!
//! 1. Load the watch page and read `INNERTUBE_API_KEY`
//! 2. Ask `/youtubei/v1/player` for the video's caption track list
//! 3. Download a track's timed-text XML and parse its `<text>` elements

use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::{CaptionTrack, TranscriptError, TranscriptResult, TranscriptSegment, TranscriptSource};
use crate::BoxFuture;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const USER_AGENT: &str = concat!("youtube-transcript-mcp/", env!("CARGO_PKG_VERSION"));
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Talks to youtube.com.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
}

impl YouTubeClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> TranscriptResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn watch_page(&self, video_id: &str) -> TranscriptResult<String> {
        let response = self
            .http
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?;
        let body = checked_body(response, video_id, "watch page").await?;

        if body.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::IpBlocked);
        }
        Ok(body)
    }

    async fn player_response(&self, video_id: &str, api_key: &str) -> TranscriptResult<Value> {
        let payload = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .http
            .post(PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?;
        let body = checked_body(response, video_id, "player response").await?;

        serde_json::from_str(&body)
            .map_err(|e| TranscriptError::parse(format!("player response is not JSON: {e}")))
    }
}

impl TranscriptSource for YouTubeClient {
    fn list_tracks<'a>(
        &'a self,
        video_id: &'a str,
    ) -> BoxFuture<'a, TranscriptResult<Vec<CaptionTrack>>> {
        Box::pin(async move {
            let page = self.watch_page(video_id).await?;
            let api_key = extract_api_key(&page)?;
            let player = self.player_response(video_id, &api_key).await?;
            caption_tracks(video_id, &player)
        })
    }

    fn fetch_track<'a>(
        &'a self,
        video_id: &'a str,
        track: &'a CaptionTrack,
    ) -> BoxFuture<'a, TranscriptResult<Vec<TranscriptSegment>>> {
        Box::pin(async move {
            let response = self.http.get(&track.base_url).send().await?;
            let body = checked_body(response, video_id, "timed text").await?;
            let segments = parse_timed_text(&body);
            tracing::debug!(
                video_id,
                language = %track.language_code,
                segments = segments.len(),
                "Parsed timed text"
            );
            Ok(segments)
        })
    }
}

/// Maps status codes to errors and rejects empty bodies.
async fn checked_body(
    response: reqwest::Response,
    video_id: &str,
    what: &'static str,
) -> TranscriptResult<String> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::RateLimited {
            video_id: video_id.to_string(),
        });
    }
    if !status.is_success() {
        return Err(TranscriptError::Status {
            status: status.as_u16(),
            what,
        });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Err(TranscriptError::EmptyResponse {
            video_id: video_id.to_string(),
        });
    }
    Ok(body)
}

fn extract_api_key(page: &str) -> TranscriptResult<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([A-Za-z0-9_-]+)""#).expect("API key pattern is valid")
    });

    pattern
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::parse("INNERTUBE_API_KEY not found in watch page"))
}

/// Reads the caption track list out of a player response.
pub(crate) fn caption_tracks(video_id: &str, player: &Value) -> TranscriptResult<Vec<CaptionTrack>> {
    let playability = &player["playabilityStatus"];
    let status = playability["status"].as_str().unwrap_or("OK");
    if status != "OK" {
        let reason = playability["reason"]
            .as_str()
            .unwrap_or(status)
            .to_string();
        return Err(TranscriptError::VideoUnavailable {
            video_id: video_id.to_string(),
            reason,
        });
    }

    let tracks: Vec<CaptionTrack> = player["captions"]["playerCaptionsTracklistRenderer"]
        ["captionTracks"]
        .as_array()
        .map(|tracks| tracks.iter().filter_map(parse_track).collect())
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    }
    Ok(tracks)
}

fn parse_track(json: &Value) -> Option<CaptionTrack> {
    let base_url = json["baseUrl"].as_str()?.replace("&fmt=srv3", "");
    let language_code = json["languageCode"].as_str()?.to_string();
    let language_name = json["name"]["runs"][0]["text"]
        .as_str()
        .or_else(|| json["name"]["simpleText"].as_str())
        .unwrap_or(&language_code)
        .to_string();

    Some(CaptionTrack {
        language_name,
        is_generated: json["kind"].as_str() == Some("asr"),
        language_code,
        base_url,
    })
}

/// Parses a timed-text XML document into segments.
///
/// Markup inside captions is dropped and HTML entities are decoded. Captions
/// that are empty after cleaning are skipped.
pub(crate) fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    static TEXT: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    let text_pattern = TEXT.get_or_init(|| {
        Regex::new(r#"(?s)<text\s+start="([^"]*)"(?:\s+dur="([^"]*)")?[^>]*>(.*?)</text>"#)
            .expect("timed text pattern is valid")
    });
    let tag_pattern = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

    text_pattern
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps[1].parse::<f64>().ok()?;
            let duration = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);
            // Caption text arrives XML-escaped around HTML-escaped content.
            let decoded = unescape_entities(&unescape_entities(&caps[3]));
            let text = tag_pattern.replace_all(&decoded, "");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text,
                start,
                duration,
            })
        })
        .collect()
}

/// Decodes named and numeric HTML entities.
pub(crate) fn unescape_entities(input: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let pattern = ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid")
    });

    pattern
        .replace_all(input, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
