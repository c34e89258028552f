use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::types::{ApiResponse, Message, PolledUpdate, User};
use crate::config::Config;
use crate::constants::{ALLOWED_UPDATES, USER_AGENT};

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("{method} request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned a malformed response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "{method} failed: {description}{}",
        .code.map_or_else(String::new, |c| format!(" (error code {c})"))
    )]
    Api {
        method: &'static str,
        code: Option<i32>,
        description: String,
    },
}

impl TelegramError {
    /// The API-provided description, when the server answered with `ok: false`.
    #[must_use]
    pub fn api_description(&self) -> Option<&str> {
        match self {
            Self::Api { description, .. } => Some(description),
            _ => None,
        }
    }
}

/// Parameters for a `getUpdates` call.
#[derive(Debug, Clone)]
pub struct GetUpdates {
    pub offset: i64,
    pub limit: u32,
    /// Long-poll timeout in seconds; zero returns immediately.
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

impl GetUpdates {
    #[must_use]
    pub fn new(offset: i64, limit: u32) -> Self {
        Self {
            offset,
            limit,
            timeout: 0,
            allowed_updates: ALLOWED_UPDATES,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ForwardMessage {
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
}

/// Minimal Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api>/bot<token>`; contains the credential, never log it.
    base_url: String,
}

impl TelegramClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.live_poll_timeout + REQUEST_GRACE)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.telegram_api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    /// Identify the bot. Used to verify the credential before listening.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        let request = self.http.get(self.method_url("getMe"));
        self.execute("getMe", request).await
    }

    /// Fetch a batch of pending updates starting at `params.offset`.
    ///
    /// Entries are decoded one by one, so an update this client cannot
    /// represent is returned as [`PolledUpdate::Undecodable`] instead of
    /// failing the whole page.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a malformed body, or `ok: false`.
    pub async fn get_updates(
        &self,
        params: &GetUpdates,
    ) -> Result<Vec<PolledUpdate>, TelegramError> {
        let allowed = serde_json::to_string(params.allowed_updates).map_err(|source| {
            TelegramError::Decode {
                method: "getUpdates",
                source,
            }
        })?;

        debug!(
            offset = params.offset,
            limit = params.limit,
            timeout = params.timeout,
            "Requesting updates"
        );

        let request = self.http.get(self.method_url("getUpdates")).query(&[
            ("offset", params.offset.to_string()),
            ("limit", params.limit.to_string()),
            ("timeout", params.timeout.to_string()),
            ("allowed_updates", allowed),
        ]);
        let page: Vec<serde_json::Value> = self.execute("getUpdates", request).await?;
        Ok(page.into_iter().map(PolledUpdate::decode).collect())
    }

    /// Forward a message from one chat to another.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Telegram refuses the forward.
    pub async fn forward_message(
        &self,
        to_chat: i64,
        from_chat: i64,
        message_id: i64,
    ) -> Result<Message, TelegramError> {
        let request = self
            .http
            .post(self.method_url("forwardMessage"))
            .json(&ForwardMessage {
                chat_id: to_chat,
                from_chat_id: from_chat,
                message_id,
            });
        self.execute("forwardMessage", request).await
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TelegramError> {
        let response = request
            .send()
            .await
            .map_err(|source| TelegramError::Transport {
                method,
                source: source.without_url(),
            })?;

        // Error responses still carry the JSON envelope, so the status is not checked here.
        let body = response
            .text()
            .await
            .map_err(|source| TelegramError::Transport {
                method,
                source: source.without_url(),
            })?;

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|source| TelegramError::Decode { method, source })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(TelegramError::Api {
                method,
                code: error_code,
                description: description.unwrap_or_else(|| "no result".to_string()),
            }),
        }
    }
}
