//! Routing of live updates.
//!
//! Channel posts with a video and videos forwarded to the bot both go through
//! the [`Pipeline`]. Channel posts without a video are forwarded to the
//! fallback chat so a person can look at them.

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::delivery::DeliveryOutcome;
use crate::pipeline::Pipeline;
use crate::record::{ForwardFilter, VideoSource};
use crate::telegram::{Message, TelegramClient, Update, UpdatePayload};

/// What the router did with one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// A video was sent to the backend.
    Delivered(DeliveryOutcome),
    /// A non-video channel post was forwarded to the fallback chat.
    ForwardedToInbox,
    /// Forwarding to the fallback chat failed; the failure was logged.
    ForwardFailed(String),
    /// Nothing to do.
    Ignored(&'static str),
}

#[derive(Clone)]
pub struct LiveEventRouter {
    client: TelegramClient,
    pipeline: Pipeline,
    fallback_chat_id: i64,
    forward_filter: ForwardFilter,
}

impl LiveEventRouter {
    #[must_use]
    pub fn new(client: TelegramClient, pipeline: Pipeline, config: &Config) -> Self {
        Self {
            client,
            pipeline,
            fallback_chat_id: config.fallback_chat_id,
            forward_filter: ForwardFilter::from_config(config),
        }
    }

    /// Handle an update on its own task.
    ///
    /// A panic while handling is logged and does not affect other updates.
    pub fn dispatch(&self, update: Update) {
        let router = self.clone();
        let update_id = update.update_id;
        tokio::spawn(async move {
            let handler = tokio::spawn(async move { router.route(&update).await });
            match handler.await {
                Ok(action) => debug!(update_id, ?action, "Update handled"),
                Err(e) => error!(update_id, "Update handler failed: {e}"),
            }
        });
    }

    /// Route one update to the matching path.
    pub async fn route(&self, update: &Update) -> RouteAction {
        match update.payload() {
            Some(UpdatePayload::ChannelPost(post)) => self.handle_channel_post(post).await,
            Some(UpdatePayload::Message(message)) => self.handle_direct_message(message).await,
            None => RouteAction::Ignored("unsupported update kind"),
        }
    }

    async fn handle_channel_post(&self, post: &Message) -> RouteAction {
        info!(
            chat_id = post.chat.id,
            chat_title = post.chat.title.as_deref().unwrap_or("N/A"),
            message_id = post.message_id,
            kind = post.kind(),
            "Received channel post"
        );

        match VideoSource::from_channel_post(post) {
            Some(source) => RouteAction::Delivered(self.pipeline.process(&source).await),
            None => self.forward_to_inbox(post).await,
        }
    }

    /// Videos forwarded into the bot's chat by a person. This is the manual
    /// fallback for posts the channel path missed.
    async fn handle_direct_message(&self, message: &Message) -> RouteAction {
        let Some(origin) = message.forwarded_from_chat() else {
            return RouteAction::Ignored("not forwarded from a chat");
        };

        info!(
            message_id = message.message_id,
            forwarded_from = origin.title.as_deref().unwrap_or("N/A"),
            origin_chat_id = origin.id,
            kind = message.kind(),
            "Received forwarded message"
        );

        if !self.forward_filter.accepts(origin) {
            debug!(
                origin_chat_id = origin.id,
                target = ?self.forward_filter.target_channel,
                "Forward is not from the target channel"
            );
            return RouteAction::Ignored("forwarded from another chat");
        }

        match VideoSource::from_forwarded_message(message) {
            Some(source) => RouteAction::Delivered(self.pipeline.process(&source).await),
            None => RouteAction::Ignored("forward without video"),
        }
    }

    async fn forward_to_inbox(&self, post: &Message) -> RouteAction {
        match self
            .client
            .forward_message(self.fallback_chat_id, post.chat.id, post.message_id)
            .await
        {
            Ok(_) => {
                info!(
                    to_chat = self.fallback_chat_id,
                    message_id = post.message_id,
                    "Forwarded post to fallback chat; forward it back to the bot to process it"
                );
                RouteAction::ForwardedToInbox
            }
            Err(e) => {
                error!(
                    to_chat = self.fallback_chat_id,
                    message_id = post.message_id,
                    "Failed to forward post to fallback chat: {e}"
                );
                if e
                    .api_description()
                    .is_some_and(|d| d.contains("chat not found"))
                {
                    warn!("Check that FALLBACK_CHAT_ID is correct and that the user has started the bot");
                }
                RouteAction::ForwardFailed(e.to_string())
            }
        }
    }
}
