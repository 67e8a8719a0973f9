//! HTTP handler for the payment-provider webhook.
//!
//! The response code communicates delivery-layer outcome only:
//! - 401 when a configured secret does not match the signature
//! - 200 for everything else, including internal failures, because a
//!   non-2xx makes the provider redeliver and business failures here
//!   are not transient the way a 5xx implies
//!
//! Nothing may escape this handler as an unhandled error.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn, Instrument};

use crate::application::handlers::billing::ProcessPaymentEventHandler;
use crate::domain::billing::{
    redact, AckStatus, ProviderEvent, SignatureError, WebhookError, WebhookVerifier,
};
use crate::domain::foundation::DeliveryId;
use crate::ports::{PaymentLedger, SubscriptionStore};

use super::dto::WebhookAck;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Shared application state for the webhook endpoint.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct WebhookAppState {
    pub ledger: Arc<dyn PaymentLedger>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub verifier: Arc<WebhookVerifier>,
}

impl WebhookAppState {
    /// Creates the event handler from the shared state.
    pub fn process_handler(&self) -> ProcessPaymentEventHandler {
        ProcessPaymentEventHandler::new(self.ledger.clone(), self.subscriptions.clone())
    }
}

/// POST /webhooks/payment-provider - Handle a provider delivery.
pub async fn handle_provider_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery_id = DeliveryId::new();
    let span = tracing::info_span!("payment_webhook", delivery_id = %delivery_id);

    match process_delivery(&state, &headers, &body).instrument(span).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => {
            let ack = match err.ack_status() {
                AckStatus::Ignored => WebhookAck::ignored(err.to_string()),
                _ => WebhookAck::error(public_reason(&err)),
            };
            (err.status_code(), Json(ack)).into_response()
        }
    }
}

/// Runs verification, parsing, and routing for one delivery.
///
/// Every failure mode is logged here, where the context (event kind,
/// order id) is still available; the caller only maps the error to a
/// response.
async fn process_delivery(
    state: &WebhookAppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<WebhookAck, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    // Verification runs over the raw bytes exactly as received; any
    // re-serialization of the parsed JSON would break the digest.
    if let Err(err) = state.verifier.verify(body, signature) {
        match err {
            SignatureError::SecretNotConfigured => {
                error!("webhook secret is not configured; acknowledging delivery without processing");
            }
            SignatureError::MissingSignature | SignatureError::Mismatch => {
                warn!(error = %err, "rejecting webhook delivery with invalid signature");
            }
        }
        return Err(err.into());
    }

    let event = match ProviderEvent::from_slice(body) {
        Ok(event) => event,
        Err(err) => {
            warn!(detail = %err, "acknowledging malformed webhook payload");
            return Err(err.into());
        }
    };

    let kind = event.kind().to_string();
    let order_id = event
        .order_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    info!(event = %kind, order_id = %order_id, payload = %redact(event.raw()), "received payment webhook");

    match state.process_handler().handle(event).await {
        Ok(result) => {
            info!(event = %kind, ?result, "payment webhook applied");
            Ok(WebhookAck::success(kind))
        }
        Err(err) => {
            // Enough context for manual reconciliation: the delivery is
            // acknowledged even though it was not durably applied.
            error!(event = %kind, order_id = %order_id, error = %err, "failed to apply webhook event");
            Err(err)
        }
    }
}

/// Reasons safe to echo back to the caller.
fn public_reason(err: &WebhookError) -> &'static str {
    match err {
        WebhookError::InvalidSignature => "invalid signature",
        WebhookError::Persistence(_) => "internal processing failure",
        WebhookError::SecretNotConfigured | WebhookError::MalformedPayload(_) => "ignored",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_reason_does_not_leak_persistence_details() {
        let err = WebhookError::Persistence("password=hunter2 connection refused".to_string());
        assert_eq!(public_reason(&err), "internal processing failure");
    }

    #[test]
    fn signature_failure_reports_invalid_signature() {
        assert_eq!(
            public_reason(&WebhookError::InvalidSignature),
            "invalid signature"
        );
    }

    #[test]
    fn ack_status_split_matches_error_classes() {
        assert_eq!(
            WebhookError::MalformedPayload("x".into()).ack_status(),
            AckStatus::Ignored
        );
        assert_eq!(
            WebhookError::Persistence("x".into()).ack_status(),
            AckStatus::Error
        );
    }
}
