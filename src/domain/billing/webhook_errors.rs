//! Error taxonomy for webhook processing.
//!
//! The HTTP response code communicates delivery-layer outcome, not
//! business-logic outcome. The provider retries on non-2xx, and a
//! business failure here is not transient the way a 5xx implies, so
//! every failure except a signature rejection is acknowledged with 200
//! and logged for out-of-band reconciliation.

use axum::http::StatusCode;
use thiserror::Error;

use super::provider_event::ParseError;
use super::webhook_verifier::SignatureError;
use crate::domain::foundation::DomainError;

/// The `status` field of the acknowledgement body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// Event handled (or safely acknowledged as unknown).
    Success,
    /// Nothing to do: misconfiguration or unusable payload.
    Ignored,
    /// Internal failure while applying the event; delivery accepted.
    Error,
}

impl AckStatus {
    /// Returns the wire value of the status field.
    pub fn as_str(&self) -> &'static str {
        match self {
            AckStatus::Success => "success",
            AckStatus::Ignored => "ignored",
            AckStatus::Error => "error",
        }
    }
}

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature missing or mismatched while a secret is configured.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// No shared secret configured; deliveries cannot be authenticated.
    #[error("webhook secret is not configured")]
    SecretNotConfigured,

    /// Request body could not be interpreted as a provider payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Store unreachable or write failure while applying the event.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Maps the error to the response code of the provider contract.
    ///
    /// 401 is reserved for authentication failures, the one case where
    /// a retry with a corrected request could succeed. Everything else
    /// is acknowledged so the provider never redelivers.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::SecretNotConfigured
            | WebhookError::MalformedPayload(_)
            | WebhookError::Persistence(_) => StatusCode::OK,
        }
    }

    /// Returns the acknowledgement status for the response body.
    pub fn ack_status(&self) -> AckStatus {
        match self {
            WebhookError::InvalidSignature | WebhookError::Persistence(_) => AckStatus::Error,
            WebhookError::SecretNotConfigured | WebhookError::MalformedPayload(_) => {
                AckStatus::Ignored
            }
        }
    }

    /// Returns true if the provider may usefully retry this delivery.
    pub fn provider_may_retry(&self) -> bool {
        matches!(self, WebhookError::InvalidSignature)
    }
}

impl From<SignatureError> for WebhookError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::SecretNotConfigured => WebhookError::SecretNotConfigured,
            SignatureError::MissingSignature | SignatureError::Mismatch => {
                WebhookError::InvalidSignature
            }
        }
    }
}

impl From<ParseError> for WebhookError {
    fn from(err: ParseError) -> Self {
        WebhookError::MalformedPayload(err.to_string())
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}
