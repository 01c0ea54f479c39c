//! The tools this server exposes.
//!
//! Every tool shares one [`TranscriptService`], so the cache is opened at most
//! once per process no matter which tool touches it first.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::mcp::registry::{RegistryError, Tool, ToolDefinition, ToolError, ToolRegistry};
use crate::service::TranscriptService;
use crate::summary::{self, SummaryType};
use crate::youtube::extract_video_id;
use crate::BoxFuture;

/// Builds the registry with every tool registered.
///
/// # Errors
///
/// Returns an error if two tools share a name.
pub fn default_registry(service: &Arc<TranscriptService>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(GetTranscript(service.clone()))?;
    registry.register(ListTranscripts(service.clone()))?;
    registry.register(SummarizeTranscript(service.clone()))?;
    registry.register(CacheStats(service.clone()))?;
    registry.register(ClearCache(service.clone()))?;
    Ok(registry)
}

// Argument helpers

fn required_str<'a>(arguments: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    optional_str(arguments, name)?.ok_or(ToolError::MissingParameter(name))
}

/// Absent, `null` and blank strings all count as not given.
fn optional_str<'a>(arguments: &'a Value, name: &str) -> Result<Option<&'a str>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then_some(s))
        }
        Some(_) => Err(ToolError::InvalidArguments(format!("{name} must be a string"))),
    }
}

fn optional_bool(arguments: &Value, name: &str, default: bool) -> Result<bool, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ToolError::InvalidArguments(format!("{name} must be a boolean"))),
    }
}

fn optional_count(arguments: &Value, name: &str) -> Result<Option<usize>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!("{name} must be a positive integer"))
            }),
    }
}

fn video_url_property() -> Value {
    json!({
        "type": "string",
        "description": "YouTube video URL (watch, youtu.be, shorts, embed or live link) or an 11-character video ID"
    })
}

/// `get_transcript`: full transcript text.
pub struct GetTranscript(pub Arc<TranscriptService>);

impl GetTranscript {
    async fn run(&self, arguments: &Value) -> Result<String, ToolError> {
        let video_url = required_str(arguments, "video_url")?;
        let use_cache = optional_bool(arguments, "use_cache", true)?;
        let language = optional_str(arguments, "language")?;

        let video_id = extract_video_id(video_url)?;
        tracing::info!(video_url, %video_id, use_cache, "Processing get_transcript");

        let transcript = self.0.transcript(&video_id, use_cache, language).await?;
        Ok(format!(
            "Video duration: {} minutes\n\n{}",
            transcript.duration_minutes, transcript.full_transcript
        ))
    }
}

impl Tool for GetTranscript {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_transcript".to_string(),
            description: Some(
                "Fetch the transcript of a YouTube video. Returns the video duration followed \
                 by the full transcript text. Results are cached on disk; set use_cache to \
                 false to force a fresh download."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "video_url": video_url_property(),
                    "use_cache": {
                        "type": "boolean",
                        "description": "Use the on-disk cache (default: true)",
                        "default": true
                    },
                    "language": {
                        "type": "string",
                        "description": "Preferred caption language code, e.g. 'en' or 'de'"
                    }
                },
                "required": ["video_url"]
            }),
        }
    }

    fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>> {
        Box::pin(self.run(arguments))
    }
}

/// `list_transcripts`: caption tracks offered for a video.
pub struct ListTranscripts(pub Arc<TranscriptService>);

impl ListTranscripts {
    async fn run(&self, arguments: &Value) -> Result<String, ToolError> {
        let video_id = extract_video_id(required_str(arguments, "video_url")?)?;
        let tracks = self.0.caption_tracks(&video_id).await?;

        let mut text = format!("Available transcripts for video {video_id}:");
        for track in &tracks {
            text.push_str(&format!(
                "\n- {} ({}, {})",
                track.language_code,
                track.language_name,
                track.kind()
            ));
        }
        Ok(text)
    }
}

impl Tool for ListTranscripts {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_transcripts".to_string(),
            description: Some(
                "List the caption tracks available for a YouTube video, with language code, \
                 language name and whether each track is manual or auto-generated."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "video_url": video_url_property()
                },
                "required": ["video_url"]
            }),
        }
    }

    fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>> {
        Box::pin(self.run(arguments))
    }
}

/// `summarize_transcript`: extractive summary of a transcript.
pub struct SummarizeTranscript(pub Arc<TranscriptService>);

impl SummarizeTranscript {
    async fn run(&self, arguments: &Value) -> Result<String, ToolError> {
        let video_url = required_str(arguments, "video_url")?;
        let summary_type = optional_str(arguments, "summary_type")?
            .map(str::parse::<SummaryType>)
            .transpose()
            .map_err(ToolError::InvalidArguments)?
            .unwrap_or_default();
        let max_length = optional_count(arguments, "max_length")?;

        let video_id = extract_video_id(video_url)?;
        tracing::info!(%video_id, %summary_type, ?max_length, "Processing summarize_transcript");

        let transcript = self.0.transcript(&video_id, true, None).await?;
        Ok(summary::summarize(&transcript, summary_type, max_length))
    }
}

impl Tool for SummarizeTranscript {
    fn definition(&self) -> ToolDefinition {
        let types: Vec<&str> = SummaryType::ALL.iter().map(|t| t.as_str()).collect();
        ToolDefinition {
            name: "summarize_transcript".to_string(),
            description: Some(
                "Summarise a YouTube video's transcript by extracting its most representative \
                 sentences. Supports brief, detailed, bullet point, key quote and chapter \
                 summaries."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "video_url": video_url_property(),
                    "summary_type": {
                        "type": "string",
                        "enum": types,
                        "description": "Kind of summary (default: detailed)",
                        "default": SummaryType::default().as_str()
                    },
                    "max_length": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Maximum number of words in the summary body"
                    }
                },
                "required": ["video_url"]
            }),
        }
    }

    fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>> {
        Box::pin(self.run(arguments))
    }
}

/// `cache_stats`: what the cache holds.
pub struct CacheStats(pub Arc<TranscriptService>);

impl CacheStats {
    async fn run(&self) -> Result<String, ToolError> {
        let stats = self.0.cache_stats().await?;
        Ok(format!(
            "Cache Statistics:\n\
             - Total videos cached: {}\n\
             - Total cache size: {} MB\n\
             - Maximum cache size: {} MB\n\
             - Cache directory: {}\n\
             - Cache expiration: {} hours",
            stats.total_videos,
            stats.total_size_mb,
            stats.max_size_mb,
            stats.cache_dir.display(),
            stats.max_age_hours
        ))
    }
}

impl Tool for CacheStats {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "cache_stats".to_string(),
            description: Some("Get transcript cache statistics".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    fn call<'a>(&'a self, _arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>> {
        Box::pin(self.run())
    }
}

/// `clear_cache`: drop one video or everything.
pub struct ClearCache(pub Arc<TranscriptService>);

impl ClearCache {
    async fn run(&self, arguments: &Value) -> Result<String, ToolError> {
        let video_id = optional_str(arguments, "video_url")?
            .map(extract_video_id)
            .transpose()?;
        let cache = self.0.cache().await?;

        match video_id {
            Some(video_id) => {
                if cache.delete(&video_id)? {
                    Ok(format!("Removed video {video_id} from the cache"))
                } else {
                    Ok(format!("Video {video_id} was not in the cache"))
                }
            }
            None => {
                let removed = cache.clear()?;
                Ok(format!("Cache cleared: {removed} cached videos removed"))
            }
        }
    }
}

impl Tool for ClearCache {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "clear_cache".to_string(),
            description: Some(
                "Remove cached transcripts. Pass video_url to remove a single video; omit it \
                 to clear the whole cache."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "video_url": video_url_property()
                }
            }),
        }
    }

    fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>> {
        Box::pin(self.run(arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use crate::mcp::registry::ToolCallResult;
    use crate::retry::RetryPolicy;
    use crate::youtube::testing::FakeSource;
    use tempfile::TempDir;

    const VIDEO: &str = "dQw4w9WgXcQ";

    fn registry(dir: &TempDir) -> ToolRegistry {
        let source = FakeSource::new().with_track(
            VIDEO,
            "en",
            false,
            &[
                "Rust gives you memory safety without garbage collection.",
                "The borrow checker enforces ownership rules at compile time.",
                "Ownership makes memory safety practical for systems code.",
            ],
        );
        let service = Arc::new(TranscriptService::new(
            Arc::new(source),
            RetryPolicy::immediate(1),
            vec!["en".to_string()],
            CacheSettings {
                directory: Some(dir.path().join("cache")),
                max_age_hours: 24,
                max_size_bytes: 1024 * 1024,
            },
        ));
        default_registry(&service).unwrap()
    }

    fn text(result: &ToolCallResult) -> &str {
        result.first_text().unwrap_or_default()
    }

    #[test]
    fn all_tools_registered_in_order() {
        let dir = TempDir::new().unwrap();
        let names: Vec<_> = registry(&dir).definitions().map(|d| d.name.clone()).collect();
        assert_eq!(
            names,
            [
                "get_transcript",
                "list_transcripts",
                "summarize_transcript",
                "cache_stats",
                "clear_cache"
            ]
        );
    }

    #[tokio::test]
    async fn get_transcript_reports_duration_and_text() {
        let dir = TempDir::new().unwrap();
        let result = registry(&dir)
            .call(
                "get_transcript",
                &json!({"video_url": format!("https://youtu.be/{VIDEO}")}),
            )
            .await;

        assert!(!result.is_error);
        assert!(text(&result).starts_with("Video duration: 0 minutes\n\nRust gives you"));
    }

    #[tokio::test]
    async fn missing_and_invalid_urls() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let result = registry.call("get_transcript", &json!({})).await;
        assert!(result.is_error);
        assert_eq!(text(&result), "Missing required parameter: video_url");

        let result = registry
            .call("get_transcript", &json!({"video_url": "https://example.com/video"}))
            .await;
        assert!(result.is_error);
        assert!(text(&result).starts_with("Invalid YouTube URL:"));

        let result = registry
            .call("get_transcript", &json!({"video_url": 42}))
            .await;
        assert!(result.is_error);
        assert!(text(&result).contains("must be a string"));
    }

    #[tokio::test]
    async fn list_transcripts_describes_tracks() {
        let dir = TempDir::new().unwrap();
        let result = registry(&dir)
            .call("list_transcripts", &json!({"video_url": VIDEO}))
            .await;

        assert!(!result.is_error);
        assert!(text(&result).contains("- en (Language en, manual)"));
    }

    #[tokio::test]
    async fn summarize_rejects_unknown_type() {
        let dir = TempDir::new().unwrap();
        let result = registry(&dir)
            .call(
                "summarize_transcript",
                &json!({"video_url": VIDEO, "summary_type": "haiku"}),
            )
            .await;

        assert!(result.is_error);
        assert!(text(&result).contains("bullet_points"));
    }

    #[tokio::test]
    async fn summarize_brief() {
        let dir = TempDir::new().unwrap();
        let result = registry(&dir)
            .call(
                "summarize_transcript",
                &json!({"video_url": VIDEO, "summary_type": "brief"}),
            )
            .await;

        assert!(!result.is_error);
        assert!(text(&result).starts_with("Summary (brief)"));
    }

    #[tokio::test]
    async fn max_length_must_be_positive() {
        let dir = TempDir::new().unwrap();
        let result = registry(&dir)
            .call(
                "summarize_transcript",
                &json!({"video_url": VIDEO, "max_length": 0}),
            )
            .await;

        assert!(result.is_error);
        assert!(text(&result).contains("max_length must be a positive integer"));
    }

    #[tokio::test]
    async fn cache_stats_and_clear() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        registry
            .call("get_transcript", &json!({"video_url": VIDEO}))
            .await;
        let stats = registry.call("cache_stats", &json!({})).await;
        assert!(text(&stats).contains("- Total videos cached: 1"));

        let removed = registry
            .call("clear_cache", &json!({"video_url": VIDEO}))
            .await;
        assert_eq!(text(&removed), format!("Removed video {VIDEO} from the cache"));

        let again = registry
            .call("clear_cache", &json!({"video_url": VIDEO}))
            .await;
        assert_eq!(text(&again), format!("Video {VIDEO} was not in the cache"));

        let cleared = registry.call("clear_cache", &Value::Null).await;
        assert_eq!(text(&cleared), "Cache cleared: 0 cached videos removed");
    }
}
