//! The subset of Bot API objects the relay reads.
//!
//! Unknown fields are ignored, and every field the relay does not strictly
//! need is optional so that older or newer API revisions still decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

/// One discrete event from `getUpdates`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
}

/// One entry of a `getUpdates` page, decoded independently of its neighbours.
#[derive(Debug)]
pub enum PolledUpdate {
    Decoded(Update),
    /// The entry did not match [`Update`]; it is acknowledged and skipped.
    Undecodable {
        update_id: Option<i64>,
        error: serde_json::Error,
    },
}

impl PolledUpdate {
    #[must_use]
    pub fn decode(raw: Value) -> Self {
        let update_id = raw.get("update_id").and_then(Value::as_i64);
        match serde_json::from_value(raw) {
            Ok(update) => Self::Decoded(update),
            Err(error) => Self::Undecodable { update_id, error },
        }
    }

    #[must_use]
    pub fn update_id(&self) -> Option<i64> {
        match self {
            Self::Decoded(update) => Some(update.update_id),
            Self::Undecodable { update_id, .. } => *update_id,
        }
    }
}

/// Which payload an update carries.
#[derive(Debug, Clone, Copy)]
pub enum UpdatePayload<'a> {
    ChannelPost(&'a Message),
    Message(&'a Message),
}

impl Update {
    /// The payload of this update, if it is one of the subscribed kinds.
    #[must_use]
    pub fn payload(&self) -> Option<UpdatePayload<'_>> {
        if let Some(post) = &self.channel_post {
            Some(UpdatePayload::ChannelPost(post))
        } else {
            self.message.as_ref().map(UpdatePayload::Message)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    /// Origin of a forwarded message (Bot API 7.0+).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_origin: Option<MessageOrigin>,
    /// Legacy forward source, still sent by some servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_from_chat: Option<Chat>,
}

impl Message {
    /// The chat a forwarded message originally came from.
    ///
    /// Returns `None` for messages that were not forwarded from a chat
    /// (including messages forwarded from a user).
    #[must_use]
    pub fn forwarded_from_chat(&self) -> Option<&Chat> {
        match &self.forward_origin {
            Some(MessageOrigin::Chat { sender_chat }) => Some(sender_chat),
            Some(MessageOrigin::Channel { chat, .. }) => Some(chat),
            Some(_) => None,
            None => self.forward_from_chat.as_ref(),
        }
    }

    /// Short human-readable description of the message content.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.video.is_some() {
            "video"
        } else if self.photo.is_some() {
            "photo"
        } else if self.document.is_some() {
            "document"
        } else {
            "text"
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    User {
        sender_user: User,
    },
    HiddenUser {
        sender_user_name: String,
    },
    Chat {
        sender_chat: Chat,
    },
    Channel {
        chat: Chat,
        #[serde(default)]
        message_id: i64,
    },
    /// Origin kinds added to the Bot API after this was written.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Video attachment as described by the Bot API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Video {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoSize {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}
