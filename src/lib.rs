//! Channel video relay library.
//!
//! Watches a Telegram channel for video posts, classifies each video by the
//! hashtags in its caption, and hands a normalised record to a processing
//! backend. Channel history is backfilled once at startup.

pub mod backfill;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod listener;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod telegram;
