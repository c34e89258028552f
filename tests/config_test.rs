//! Tests for loading configuration from the environment.

use std::time::Duration;

use channel_video_relay::config::{Config, ConfigError};
use serial_test::serial;

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "CHANNEL_ID",
    "FALLBACK_CHAT_ID",
    "USER_ID",
    "BACKEND_URL",
    "TELEGRAM_API_URL",
    "BACKFILL_ENABLED",
    "BACKFILL_PAGE_SIZE",
    "BACKFILL_PAGE_DELAY_MS",
    "LIVE_POLL_TIMEOUT_SECS",
    "DELIVERY_TIMEOUT_SECS",
    "FORWARD_REQUIRE_TARGET_CHANNEL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_minimal_environment_uses_defaults() {
    clear_env();
    std::env::set_var("BOT_TOKEN", "123:abc");
    std::env::set_var("FALLBACK_CHAT_ID", "1956288165");

    let config = Config::from_env().unwrap();
    config.validate().unwrap();

    assert_eq!(config.fallback_chat_id, 1_956_288_165);
    assert_eq!(config.channel_id, None);
    assert_eq!(
        config.backend_url,
        "http://localhost:8080/api/telegram/process-video"
    );
    assert_eq!(config.telegram_api_url, "https://api.telegram.org");
    assert!(config.backfill_enabled);
    assert_eq!(config.backfill_page_size, 100);
    assert_eq!(config.backfill_page_delay, Duration::from_millis(100));
    assert!(!config.forward_require_target_channel);

    clear_env();
}

#[test]
#[serial]
fn test_missing_token_is_an_error() {
    clear_env();
    std::env::set_var("FALLBACK_CHAT_ID", "1");

    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::MissingEnvVar(name)) if name == "BOT_TOKEN"
    ));

    clear_env();
}

#[test]
#[serial]
fn test_missing_fallback_chat_is_an_error() {
    clear_env();
    std::env::set_var("BOT_TOKEN", "123:abc");

    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::MissingEnvVar(name)) if name == "FALLBACK_CHAT_ID"
    ));

    clear_env();
}

#[test]
#[serial]
fn test_user_id_alias_and_bare_channel_id() {
    clear_env();
    std::env::set_var("BOT_TOKEN", "123:abc");
    std::env::set_var("USER_ID", "77");
    std::env::set_var("CHANNEL_ID", "1003264139245");
    std::env::set_var("FORWARD_REQUIRE_TARGET_CHANNEL", "yes");

    let config = Config::from_env().unwrap();
    config.validate().unwrap();

    assert_eq!(config.fallback_chat_id, 77);
    assert_eq!(config.channel_id, Some(-1_003_264_139_245));
    assert!(config.forward_require_target_channel);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_values() {
    clear_env();
    std::env::set_var("BOT_TOKEN", "123:abc");
    std::env::set_var("FALLBACK_CHAT_ID", "1");
    std::env::set_var("BACKFILL_ENABLED", "maybe");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseBool { .. })
    ));

    std::env::remove_var("BACKFILL_ENABLED");
    std::env::set_var("BACKFILL_PAGE_SIZE", "500");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    std::env::remove_var("BACKFILL_PAGE_SIZE");
    std::env::set_var("BACKEND_URL", "not a url");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}
