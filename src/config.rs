use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_BACKEND_URL, DEFAULT_TELEGRAM_API_URL, MAX_PAGE_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub telegram_api_url: String,
    pub channel_id: Option<i64>,
    pub fallback_chat_id: i64,
    pub live_poll_timeout: Duration,

    // Backend
    pub backend_url: String,
    pub delivery_timeout: Duration,

    // Backfill
    pub backfill_enabled: bool,
    pub backfill_page_size: u32,
    pub backfill_page_delay: Duration,

    // Routing
    pub forward_require_target_channel: bool,
}

// The bot token is a credential; keep it out of Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("channel_id", &self.channel_id)
            .field("fallback_chat_id", &self.fallback_chat_id)
            .field("live_poll_timeout", &self.live_poll_timeout)
            .field("backend_url", &self.backend_url)
            .field("delivery_timeout", &self.delivery_timeout)
            .field("backfill_enabled", &self.backfill_enabled)
            .field("backfill_page_size", &self.backfill_page_size)
            .field("backfill_page_delay", &self.backfill_page_delay)
            .field(
                "forward_require_target_channel",
                &self.forward_require_target_channel,
            )
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fallback_chat = optional_env("FALLBACK_CHAT_ID")
            .or_else(|| optional_env("USER_ID"))
            .ok_or_else(|| ConfigError::MissingEnvVar("FALLBACK_CHAT_ID".to_string()))?;

        Ok(Self {
            // Telegram
            bot_token: required_env("BOT_TOKEN")?,
            telegram_api_url: env_or_default("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
            channel_id: optional_env("CHANNEL_ID")
                .map(|v| parse_channel_id("CHANNEL_ID", &v))
                .transpose()?,
            fallback_chat_id: parse_chat_id("FALLBACK_CHAT_ID", &fallback_chat)?,
            live_poll_timeout: Duration::from_secs(parse_env_u64("LIVE_POLL_TIMEOUT_SECS", 30)?),

            // Backend
            backend_url: env_or_default("BACKEND_URL", DEFAULT_BACKEND_URL),
            delivery_timeout: Duration::from_secs(parse_env_u64("DELIVERY_TIMEOUT_SECS", 30)?),

            // Backfill
            backfill_enabled: parse_env_bool("BACKFILL_ENABLED", true)?,
            backfill_page_size: parse_env_u32("BACKFILL_PAGE_SIZE", MAX_PAGE_SIZE)?,
            backfill_page_delay: Duration::from_millis(parse_env_u64(
                "BACKFILL_PAGE_DELAY_MS",
                100,
            )?),

            // Routing
            forward_require_target_channel: parse_env_bool(
                "FORWARD_REQUIRE_TARGET_CHANNEL",
                false,
            )?,
        })
    }

    /// A complete configuration pointing at localhost, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bot_token: "123456:TEST-TOKEN".to_string(),
            telegram_api_url: "http://127.0.0.1:1".to_string(),
            channel_id: Some(-100_123_456_789),
            fallback_chat_id: 42_000,
            live_poll_timeout: Duration::from_secs(0),
            backend_url: "http://127.0.0.1:1/api/telegram/process-video".to_string(),
            delivery_timeout: Duration::from_secs(5),
            backfill_enabled: true,
            backfill_page_size: MAX_PAGE_SIZE,
            backfill_page_delay: Duration::ZERO,
            forward_require_target_channel: false,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "BOT_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.backfill_page_size == 0 || self.backfill_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                name: "BACKFILL_PAGE_SIZE".to_string(),
                message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        if let Err(e) = url::Url::parse(&self.backend_url) {
            return Err(ConfigError::InvalidValue {
                name: "BACKEND_URL".to_string(),
                message: e.to_string(),
            });
        }
        if let Err(e) = url::Url::parse(&self.telegram_api_url) {
            return Err(ConfigError::InvalidValue {
                name: "TELEGRAM_API_URL".to_string(),
                message: e.to_string(),
            });
        }
        if self.forward_require_target_channel && self.channel_id.is_none() {
            return Err(ConfigError::InvalidValue {
                name: "CHANNEL_ID".to_string(),
                message: "required when FORWARD_REQUIRE_TARGET_CHANNEL is enabled".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_chat_id(name: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::ParseInt {
        name: name.to_string(),
        source: e,
    })
}

/// Channel ids are negative; a bare positive id gets the `-` prefix.
fn parse_channel_id(name: &str, value: &str) -> Result<i64, ConfigError> {
    let value = value.trim();
    if value.starts_with('-') {
        parse_chat_id(name, value)
    } else {
        parse_chat_id(name, &format!("-{value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_id() {
        assert_eq!(
            parse_channel_id("CHANNEL_ID", "-1003264139245").unwrap(),
            -1_003_264_139_245
        );
        assert_eq!(
            parse_channel_id("CHANNEL_ID", "1003264139245").unwrap(),
            -1_003_264_139_245
        );
        assert!(parse_channel_id("CHANNEL_ID", "nest-pre").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_validate_page_size() {
        let mut config = Config::for_testing();
        assert!(config.validate().is_ok());

        config.backfill_page_size = 0;
        assert!(config.validate().is_err());

        config.backfill_page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_filter_needs_channel() {
        let config = Config {
            channel_id: None,
            forward_require_target_channel: true,
            ..Config::for_testing()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "CHANNEL_ID"
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Config::for_testing());
        assert!(!rendered.contains("TEST-TOKEN"));
        assert!(rendered.contains("<redacted>"));
    }
}
