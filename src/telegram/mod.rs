//! Telegram Bot API boundary: update types and a thin HTTP client.

mod client;
mod types;

pub use client::{GetUpdates, TelegramClient, TelegramError};
pub use types::{
    ApiResponse, Chat, Document, Message, MessageOrigin, PhotoSize, PolledUpdate, Update, UpdatePayload, User,
    Video,
};
