//! Datafeed Configuration Settings
//!
//! Configuration types for the datafeed service, loaded from environment
//! variables.

use std::time::Duration;

use crate::infrastructure::polygon::auth::{ApiKey, AuthError};
use crate::infrastructure::polygon::rest::DEFAULT_REST_URL;
use crate::infrastructure::polygon::stream::DEFAULT_STREAM_URL;

// =============================================================================
// Liveness Mode
// =============================================================================

/// How live bar updates reach subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivenessMode {
    /// Stream bars over the WebSocket push channel.
    #[default]
    Push,
    /// Poll the history endpoint on a fixed interval.
    Poll,
}

impl LivenessMode {
    /// Parse mode from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "poll" | "false" | "0" => Self::Poll,
            _ => Self::Push,
        }
    }

    /// Check if live updates are pushed.
    #[must_use]
    pub const fn is_push(&self) -> bool {
        matches!(self, Self::Push)
    }
}

// =============================================================================
// Polling Settings
// =============================================================================

/// Settings for poll-mode liveness.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Interval between history polls.
    pub interval: Duration,
    /// Trailing window fetched on each poll.
    pub window: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            window: Duration::from_secs(120),
        }
    }
}

// =============================================================================
// Datafeed Configuration
// =============================================================================

/// Complete datafeed configuration.
#[derive(Debug, Clone)]
pub struct DatafeedConfig {
    /// Provider API key.
    pub api_key: ApiKey,
    /// REST base URL.
    pub rest_url: String,
    /// WebSocket URL for the push channel.
    pub stream_url: String,
    /// Liveness mode (push vs poll).
    pub liveness: LivenessMode,
    /// Poll-mode settings.
    pub poll: PollSettings,
    /// Delay before each reconnection attempt.
    pub reconnect_delay: Duration,
}

impl DatafeedConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `POLYGON_API_KEY` is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("POLYGON_API_KEY".to_string()))?;

        let api_key = ApiKey::new(api_key).map_err(|e| match e {
            AuthError::EmptyKey => ConfigError::EmptyValue("POLYGON_API_KEY".to_string()),
            AuthError::Rejected(reason) => ConfigError::InvalidValue {
                key: "POLYGON_API_KEY".to_string(),
                reason,
            },
        })?;

        let rest_url =
            std::env::var("POLYGON_REST_URL").unwrap_or_else(|_| DEFAULT_REST_URL.to_string());

        let stream_url =
            std::env::var("POLYGON_WS_URL").unwrap_or_else(|_| DEFAULT_STREAM_URL.to_string());

        let liveness = std::env::var("POLYGON_LIVE_PUSH")
            .map(|s| LivenessMode::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let poll = PollSettings {
            interval: parse_env_duration_secs(
                "POLYGON_POLL_INTERVAL_SECS",
                PollSettings::default().interval,
            ),
            window: parse_env_duration_secs(
                "POLYGON_POLL_WINDOW_SECS",
                PollSettings::default().window,
            ),
        };

        let reconnect_delay =
            parse_env_duration_millis("POLYGON_RECONNECT_DELAY_MS", Duration::from_secs(2));

        Ok(Self {
            api_key,
            rest_url,
            stream_url,
            liveness,
            poll,
            reconnect_delay,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable failed validation.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What made it invalid.
        reason: String,
    },
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_mode_parsing() {
        assert_eq!(
            LivenessMode::from_str_case_insensitive("push"),
            LivenessMode::Push
        );
        assert_eq!(
            LivenessMode::from_str_case_insensitive("TRUE"),
            LivenessMode::Push
        );
        assert_eq!(
            LivenessMode::from_str_case_insensitive("poll"),
            LivenessMode::Poll
        );
        assert_eq!(
            LivenessMode::from_str_case_insensitive("false"),
            LivenessMode::Poll
        );
        assert_eq!(
            LivenessMode::from_str_case_insensitive("0"),
            LivenessMode::Poll
        );
    }

    #[test]
    fn liveness_mode_defaults_to_push() {
        assert!(LivenessMode::default().is_push());
    }

    #[test]
    fn poll_settings_defaults() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(15));
        assert_eq!(settings.window, Duration::from_secs(120));
    }
}
