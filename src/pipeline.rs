//! Shared build-and-deliver path used by backfill and live intake.

use tracing::{debug, error, info, warn};

use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::record::{build, VideoSource};

/// Builds a record for each video source and delivers it to the backend.
#[derive(Clone)]
pub struct Pipeline {
    delivery: DeliveryClient,
}

impl Pipeline {
    #[must_use]
    pub fn new(delivery: DeliveryClient) -> Self {
        Self { delivery }
    }

    /// Process one video. The outcome is logged and returned for bookkeeping.
    pub async fn process(&self, source: &VideoSource) -> DeliveryOutcome {
        let attachment = &source.attachment;
        let record = build(source);
        let size_mb = attachment
            .size_mb()
            .map_or_else(|| "N/A".to_string(), |mb| format!("{mb:.2}"));

        debug!(
            file_name = %record.file_name,
            file_id = %attachment.file_id,
            file_size_mb = %size_mb,
            file_size = ?attachment.file_size,
            file_unique_id = attachment.file_unique_id.as_deref().unwrap_or("N/A"),
            duration = ?attachment.duration,
            width = ?attachment.width,
            height = ?attachment.height,
            mime_type = attachment.mime_type.as_deref().unwrap_or("N/A"),
            message_id = source.message_id,
            chat_id = source.chat_id,
            chat_title = source.chat_title.as_deref().unwrap_or("N/A"),
            "Video details"
        );

        let outcome = self.delivery.deliver(&record).await;

        match &outcome {
            DeliveryOutcome::Accepted => info!(
                message_id = record.message_id,
                file_name = %record.file_name,
                category = %record.category,
                recorded_at = record.recorded_at.as_deref().unwrap_or("N/A"),
                "Video accepted by backend"
            ),
            DeliveryOutcome::Rejected { message, timestamp } => warn!(
                message_id = record.message_id,
                file_name = %record.file_name,
                reason = message.as_deref().unwrap_or("N/A"),
                timestamp = timestamp.as_deref().unwrap_or("N/A"),
                "Video not accepted by backend (it may already exist)"
            ),
            DeliveryOutcome::TransportFailed { reason } => error!(
                message_id = record.message_id,
                file_name = %record.file_name,
                url = %self.delivery.endpoint(),
                reason = %reason,
                "Video delivery failed"
            ),
        }

        outcome
    }
}
