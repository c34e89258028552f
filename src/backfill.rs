//! One-time backfill of channel history.
//!
//! Pages through `getUpdates` from offset 0, delivering every video found.
//! The cursor lives only in the [`HistoryBackfiller`] value: a restart scans
//! history again and the backend absorbs the duplicates.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::MAX_PAGE_SIZE;
use crate::delivery::DeliveryOutcome;
use crate::pipeline::Pipeline;
use crate::record::{video_source, ForwardFilter};
use crate::telegram::{GetUpdates, PolledUpdate, TelegramClient};

/// Configuration for the history backfill.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Number of updates requested per page.
    pub page_size: u32,
    /// Pause between pages.
    pub page_delay: Duration,
    pub forward_filter: ForwardFilter,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            page_delay: Duration::from_millis(100),
            forward_filter: ForwardFilter::default(),
        }
    }
}

impl From<&Config> for BackfillConfig {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.backfill_page_size,
            page_delay: config.backfill_page_delay,
            forward_filter: ForwardFilter::from_config(config),
        }
    }
}

/// What a finished backfill did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub pages: u32,
    pub updates_scanned: u64,
    pub videos_found: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Entries that could not be decoded and were skipped.
    pub undecodable: u64,
    /// Next unprocessed update id.
    pub cursor: i64,
    /// Set when a page query failed and the backfill stopped early.
    pub aborted: Option<String>,
}

impl BackfillSummary {
    fn record_outcome(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Accepted => self.accepted += 1,
            DeliveryOutcome::Rejected { .. } => self.rejected += 1,
            DeliveryOutcome::TransportFailed { .. } => self.failed += 1,
        }
    }
}

/// Drains the update history once.
///
/// `run` consumes the backfiller, so a run cannot be restarted or resumed.
pub struct HistoryBackfiller {
    client: TelegramClient,
    pipeline: Pipeline,
    config: BackfillConfig,
    cursor: i64,
}

impl HistoryBackfiller {
    #[must_use]
    pub fn new(client: TelegramClient, pipeline: Pipeline, config: BackfillConfig) -> Self {
        Self {
            client,
            pipeline,
            config,
            cursor: 0,
        }
    }

    /// Page through history until it is exhausted or a query fails.
    pub async fn run(mut self) -> BackfillSummary {
        info!(page_size = self.config.page_size, "Loading existing videos from channel history");

        let mut summary = BackfillSummary::default();

        loop {
            let params = GetUpdates::new(self.cursor, self.config.page_size);
            let page = match self.client.get_updates(&params).await {
                Ok(page) => page,
                Err(e) => {
                    error!(cursor = self.cursor, "History query failed, stopping backfill: {e}");
                    summary.aborted = Some(e.to_string());
                    break;
                }
            };

            if page.is_empty() {
                debug!(cursor = self.cursor, "No more updates");
                break;
            }

            summary.pages += 1;
            let page_len = page.len();
            info!(updates = page_len, offset = self.cursor, "Received history page");

            self.process_page(&page, &mut summary).await;

            // A short page is the last one.
            if page_len < self.config.page_size as usize {
                break;
            }

            tokio::time::sleep(self.config.page_delay).await;
        }

        summary.cursor = self.cursor;
        info!(
            pages = summary.pages,
            updates = summary.updates_scanned,
            videos = summary.videos_found,
            accepted = summary.accepted,
            rejected = summary.rejected,
            failed = summary.failed,
            undecodable = summary.undecodable,
            cursor = summary.cursor,
            aborted = summary.aborted.is_some(),
            "History backfill finished"
        );
        summary
    }

    /// Deliver the videos in one page, then move the cursor past it.
    async fn process_page(&mut self, page: &[PolledUpdate], summary: &mut BackfillSummary) {
        let mut max_update_id = None;

        for entry in page {
            let update_id = entry.update_id();
            max_update_id = max_update_id.max(update_id);

            // The server should never resend confirmed updates; skip them if it does.
            if let Some(id) = update_id.filter(|&id| id < self.cursor) {
                warn!(update_id = id, cursor = self.cursor, "Skipping update behind the cursor");
                continue;
            }
            summary.updates_scanned += 1;

            let update = match entry {
                PolledUpdate::Decoded(update) => update,
                PolledUpdate::Undecodable { update_id, error } => {
                    warn!(?update_id, error = %error, "Skipping undecodable history update");
                    summary.undecodable += 1;
                    continue;
                }
            };

            let Some(source) = video_source(update, self.config.forward_filter) else {
                continue;
            };

            summary.videos_found += 1;
            info!(
                n = summary.videos_found,
                update_id = update.update_id,
                message_id = source.message_id,
                chat_id = source.chat_id,
                chat_title = source.chat_title.as_deref().unwrap_or("N/A"),
                "Found video in history"
            );
            let outcome = self.pipeline.process(&source).await;
            summary.record_outcome(&outcome);
        }

        if let Some(max_id) = max_update_id {
            self.cursor = self.cursor.max(max_id + 1);
        }
    }
}
