//! Live update listening via `getUpdates` long polling.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::constants::{ALLOWED_UPDATES, MAX_PAGE_SIZE};
use crate::router::LiveEventRouter;
use crate::telegram::{GetUpdates, PolledUpdate, TelegramClient, TelegramError, User};

/// Pause after a failed poll before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Verify the bot credential before listening starts.
///
/// # Errors
///
/// Returns an error if Telegram cannot be reached or rejects the token.
pub async fn start_listening(client: &TelegramClient) -> Result<User, TelegramError> {
    let me = client.get_me().await?;
    info!(
        bot_id = me.id,
        bot_username = me.username.as_deref().unwrap_or("N/A"),
        bot_name = %me.first_name,
        allowed_updates = ?ALLOWED_UPDATES,
        "Listener started"
    );
    Ok(me)
}

/// Long-poll for updates forever, handing each one to the router.
///
/// Pending updates are not dropped: the first request starts at offset 0.
pub async fn listen_loop(client: TelegramClient, router: LiveEventRouter, poll_timeout: Duration) {
    let mut offset = 0i64;

    loop {
        let params = GetUpdates::new(offset, MAX_PAGE_SIZE).with_timeout(poll_timeout.as_secs());

        match client.get_updates(&params).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!(count = updates.len(), offset, "Received live updates");
                }
                for entry in updates {
                    if let Some(id) = entry.update_id() {
                        offset = offset.max(id + 1);
                    }
                    match entry {
                        PolledUpdate::Decoded(update) => router.dispatch(update),
                        PolledUpdate::Undecodable { update_id, error } => {
                            warn!(?update_id, error = %error, "Skipping undecodable live update");
                        }
                    }
                }
            }
            Err(e) => {
                error!("Live poll error: {e}");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
}
