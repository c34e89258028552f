//! Delivery of video records to the processing backend.
//!
//! One form-encoded POST per record. Failures are reported as a
//! [`DeliveryOutcome`] instead of an error: nothing is retried or queued, and
//! the backend is responsible for ignoring resubmitted videos.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::record::VideoRecord;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The backend stored the video.
    Accepted,
    /// The backend answered but declined the video (for example, it already exists).
    Rejected {
        message: Option<String>,
        timestamp: Option<String>,
    },
    /// The request failed or the response was not understood.
    TransportFailed { reason: String },
}

impl DeliveryOutcome {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Human-readable reason for a non-accepted outcome.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted => None,
            Self::Rejected { message, .. } => message.as_deref(),
            Self::TransportFailed { reason } => Some(reason),
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected { message, .. } => {
                write!(f, "rejected: {}", message.as_deref().unwrap_or("N/A"))
            }
            Self::TransportFailed { reason } => write!(f, "transport failed: {reason}"),
        }
    }
}

/// Form fields sent for a record. `recordedDateTime` is left out when unknown.
#[must_use]
pub fn form_fields(record: &VideoRecord) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("fileId", record.file_id.clone()),
        ("fileName", record.file_name.clone()),
        ("messageId", record.message_id.to_string()),
        ("category", record.category.as_str().to_string()),
    ];
    if let Some(recorded_at) = &record.recorded_at {
        fields.push(("recordedDateTime", recorded_at.clone()));
    }
    fields
}

/// Client for the backend's video intake endpoint.
#[derive(Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DeliveryClient {
    /// Create a delivery client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.delivery_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.backend_url.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver a record. Waits for the backend's answer; never retries.
    pub async fn deliver(&self, record: &VideoRecord) -> DeliveryOutcome {
        let fields = form_fields(record);
        debug!(
            url = %self.endpoint,
            file_id = %record.file_id,
            file_name = %record.file_name,
            message_id = record.message_id,
            category = %record.category,
            recorded_at = record.recorded_at.as_deref().unwrap_or("N/A"),
            "Sending video to backend"
        );

        let response = match self.http.post(&self.endpoint).form(&fields).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.endpoint, error = %e, "Failed to send video to backend");
                return DeliveryOutcome::TransportFailed {
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %self.endpoint, %status, error = %e, "Failed to read backend response");
                return DeliveryOutcome::TransportFailed {
                    reason: e.to_string(),
                };
            }
        };
        debug!(%status, body = %body, "Backend response");

        interpret_response(&body)
    }
}

/// Map a backend response body to an outcome. The HTTP status is not
/// consulted; the backend reports failures in the body.
///
/// `success` is read loosely: `false`, `null`, `0`, `""` and a missing field
/// all count as a rejection. Only a body that is not JSON is a failure.
fn interpret_response(body: &str) -> DeliveryOutcome {
    let response: Value = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            return DeliveryOutcome::TransportFailed {
                reason: format!("malformed backend response: {e}"),
            };
        }
    };

    if is_truthy(response.get("success")) {
        DeliveryOutcome::Accepted
    } else {
        DeliveryOutcome::Rejected {
            message: text_field(&response, "message"),
            timestamp: text_field(&response, "timestamp"),
        }
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Informational field rendered as text, whatever its JSON type.
fn text_field(response: &Value, name: &str) -> Option<String> {
    match response.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
