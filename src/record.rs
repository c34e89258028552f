//! Normalised video records.
//!
//! Both intake paths (channel posts and videos forwarded to the bot) reduce a
//! Telegram message to a [`VideoSource`]; [`build`] turns that into the
//! [`VideoRecord`] handed to the backend.

use crate::classifier::{classify, Category};
use crate::config::Config;
use crate::telegram::{Chat, Message, Update, UpdatePayload, Video};

/// Video attachment details carried through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub duration: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
}

impl From<&Video> for Attachment {
    fn from(video: &Video) -> Self {
        Self {
            file_id: video.file_id.clone(),
            file_unique_id: video.file_unique_id.clone(),
            file_name: video.file_name.clone(),
            file_size: video.file_size,
            duration: video.duration,
            width: video.width,
            height: video.height,
            mime_type: video.mime_type.clone(),
        }
    }
}

impl Attachment {
    /// Declared size in megabytes, for logging.
    #[must_use]
    pub fn size_mb(&self) -> Option<f64> {
        self.file_size.map(|bytes| bytes as f64 / 1024.0 / 1024.0)
    }
}

/// A video-bearing message reduced to what the record builder needs.
#[derive(Debug, Clone)]
pub struct VideoSource {
    pub attachment: Attachment,
    pub message_id: i64,
    pub caption: Option<String>,
    /// Chat the video was observed in, for diagnostics only.
    pub chat_id: i64,
    pub chat_title: Option<String>,
}

impl VideoSource {
    /// Extract a video source from any message; `None` when it has no video.
    #[must_use]
    pub fn from_message(message: &Message) -> Option<Self> {
        let video = message.video.as_ref()?;
        Some(Self {
            attachment: Attachment::from(video),
            message_id: message.message_id,
            caption: message.caption.clone(),
            chat_id: message.chat.id,
            chat_title: message.chat.title.clone(),
        })
    }

    /// Adapter for posts authored by a channel.
    #[must_use]
    pub fn from_channel_post(post: &Message) -> Option<Self> {
        Self::from_message(post)
    }

    /// Adapter for a channel post a user forwarded to the bot.
    ///
    /// The forwarding message's own id and caption identify the video; the
    /// origin chat is recorded for diagnostics. Returns `None` unless the
    /// message is a forward from a chat and carries a video.
    #[must_use]
    pub fn from_forwarded_message(message: &Message) -> Option<Self> {
        let origin = message.forwarded_from_chat()?;
        let mut source = Self::from_message(message)?;
        source.chat_id = origin.id;
        source.chat_title = origin.title.clone();
        Some(source)
    }
}

/// Which forwarded messages are eligible for delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardFilter {
    /// When set, only forwards originating from this chat are accepted.
    pub target_channel: Option<i64>,
}

impl ForwardFilter {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_channel: config
                .channel_id
                .filter(|_| config.forward_require_target_channel),
        }
    }

    #[must_use]
    pub fn accepts(&self, origin: &Chat) -> bool {
        self.target_channel.is_none_or(|id| id == origin.id)
    }
}

/// Video carried by an update, if it is eligible for delivery.
///
/// Channel posts qualify whenever they have a video; direct messages only
/// when they are forwards from a chat the filter accepts.
#[must_use]
pub fn video_source(update: &Update, filter: ForwardFilter) -> Option<VideoSource> {
    match update.payload()? {
        UpdatePayload::ChannelPost(post) => VideoSource::from_channel_post(post),
        UpdatePayload::Message(message) => {
            let origin = message.forwarded_from_chat()?;
            if !filter.accepts(origin) {
                return None;
            }
            VideoSource::from_forwarded_message(message)
        }
    }
}

/// Normalised unit delivered to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub file_id: String,
    pub file_name: String,
    pub message_id: i64,
    pub category: Category,
    pub recorded_at: Option<String>,
}

/// File name used when the attachment does not declare one.
#[must_use]
pub fn default_file_name(message_id: i64) -> String {
    format!("video_{message_id}.mp4")
}

/// Build the record for a video source.
#[must_use]
pub fn build(source: &VideoSource) -> VideoRecord {
    let classification = classify(source.caption.as_deref());

    VideoRecord {
        file_id: source.attachment.file_id.clone(),
        file_name: source
            .attachment
            .file_name
            .clone()
            .unwrap_or_else(|| default_file_name(source.message_id)),
        message_id: source.message_id,
        category: classification.category,
        recorded_at: classification.recorded_at,
    }
}
