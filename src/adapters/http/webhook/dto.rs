//! Response DTOs for the webhook endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::billing::AckStatus;

/// Acknowledgement body returned to the payment provider.
///
/// `status` communicates the delivery-layer outcome; `event` echoes the
/// kind on success for observability; `reason` carries a short
/// non-sensitive explanation for ignored/error acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookAck {
    /// Successful acknowledgement echoing the event kind.
    pub fn success(event: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Success.as_str().to_string(),
            event: Some(event.into()),
            reason: None,
        }
    }

    /// Acknowledgement for a delivery there was nothing to do with.
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Ignored.as_str().to_string(),
            event: None,
            reason: Some(reason.into()),
        }
    }

    /// Acknowledgement for a delivery that failed internally.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error.as_str().to_string(),
            event: None,
            reason: Some(reason.into()),
        }
    }
}
