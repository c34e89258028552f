//! Shared constants used across the application.

/// User agent string sent with Bot API and backend requests.
pub const USER_AGENT: &str = concat!("channel-video-relay/", env!("CARGO_PKG_VERSION"));

/// Update kinds the bot subscribes to, both live and during backfill.
pub const ALLOWED_UPDATES: &[&str] = &["channel_post", "message"];

/// Largest page the Bot API returns from `getUpdates`.
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api/telegram/process-video";
