//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Transcript cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// YouTube client settings.
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Retry settings for YouTube requests.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_age_hours == 0 {
            return Err(validation("cache.max_age_hours must be greater than 0"));
        }
        if self.cache.max_size_mb == 0 {
            return Err(validation("cache.max_size_mb must be greater than 0"));
        }
        if self.youtube.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(validation("youtube.languages must not contain empty codes"));
        }
        if self.youtube.request_timeout_secs == 0 {
            return Err(validation(
                "youtube.request_timeout_secs must be greater than 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(validation("retry.max_attempts must be at least 1"));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "retry.min_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                    self.retry.min_delay_ms, self.retry.max_delay_ms
                ),
            });
        }
        if self.retry.rate_limit_wait_secs > self.retry.max_rate_limit_wait_secs {
            return Err(validation(
                "retry.rate_limit_wait_secs must not exceed retry.max_rate_limit_wait_secs",
            ));
        }
        Ok(())
    }

    /// Builds the retry policy described by the `retry` section.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            min_delay: Duration::from_millis(self.retry.min_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            rate_limit_wait: Duration::from_secs(self.retry.rate_limit_wait_secs),
            max_rate_limit_wait: Duration::from_secs(self.retry.max_rate_limit_wait_secs),
        }
    }
}

fn validation(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

/// Transcript cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory. Defaults to `~/.youtube_mcp_cache`.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Entries older than this are discarded on read.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,

    /// Oldest entries are evicted once the cache grows beyond this size.
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_age_hours: default_max_age_hours(),
            max_size_mb: default_max_size_mb(),
        }
    }
}

const fn default_max_age_hours() -> u64 {
    24 * 7
}

const fn default_max_size_mb() -> u64 {
    100
}

/// YouTube client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YouTubeConfig {
    /// Preferred caption languages, most preferred first.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Timeout for a single HTTP request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

const fn default_request_timeout() -> u64 {
    30
}

/// Retry configuration for YouTube requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lower bound of the random delay before each attempt.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the random delay before each attempt.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Base wait after a rate-limited response; doubles per attempt.
    #[serde(default = "default_rate_limit_wait")]
    pub rate_limit_wait_secs: u64,

    /// Cap for the rate-limit wait.
    #[serde(default = "default_max_rate_limit_wait")]
    pub max_rate_limit_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            rate_limit_wait_secs: default_rate_limit_wait(),
            max_rate_limit_wait_secs: default_max_rate_limit_wait(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_min_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    1500
}

const fn default_rate_limit_wait() -> u64 {
    5
}

const fn default_max_rate_limit_wait() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_age_hours, 168);
        assert_eq!(config.youtube.languages, vec!["en".to_string()]);
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "cache": {
                "directory": "/tmp/yt-cache",
                "max_age_hours": 24,
                "max_size_mb": 10
            },
            "youtube": {
                "languages": ["de", "en"],
                "request_timeout_secs": 10
            },
            "retry": {
                "max_attempts": 5,
                "min_delay_ms": 100,
                "max_delay_ms": 200,
                "rate_limit_wait_secs": 2,
                "max_rate_limit_wait_secs": 30
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.directory, Some(PathBuf::from("/tmp/yt-cache")));
        assert_eq!(config.cache.max_size_mb, 10);
        assert_eq!(config.youtube.languages, vec!["de", "en"]);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.logging.level, "debug");

        let policy = config.retry_policy();
        assert_eq!(policy.min_delay, Duration::from_millis(100));
        assert_eq!(policy.rate_limit_wait, Duration::from_secs(2));
    }

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.min_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 1500);
        assert_eq!(config.rate_limit_wait_secs, 5);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_zero_attempts() {
        let json = r#"{ "retry": { "max_attempts": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_inverted_delay_range() {
        let json = r#"{ "retry": { "min_delay_ms": 2000, "max_delay_ms": 1000 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_delay_ms"));
    }

    #[test]
    fn reject_empty_language() {
        let json = r#"{ "youtube": { "languages": ["en", " "] } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
