//! Typed envelope for payment-provider webhook payloads.
//!
//! The provider posts loosely-shaped JSON; this module classifies each
//! payload into a tagged union at the parsing boundary so downstream
//! handlers are exhaustively matched. Every variant keeps the full raw
//! payload for the ledger audit trail.

use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::OrderId;

/// Event kind strings used on the wire.
pub const EVENT_PAYMENT_CONFIRMED: &str = "payment.confirmed";
pub const EVENT_PAYMENT_FAILED: &str = "payment.failed";
pub const EVENT_PAYMENT_CANCELED: &str = "payment.canceled";
pub const EVENT_BILLING_SCHEDULED: &str = "billing.scheduled";

/// Failed to interpret the raw body as a webhook payload.
///
/// Malformed payloads are acknowledged (200), never rejected, so this
/// error only ever terminates in a log line.
#[derive(Debug, Clone, Error)]
#[error("malformed webhook payload: {0}")]
pub struct ParseError(pub String);

/// A payment-provider webhook event, one variant per handled kind.
///
/// A recognized kind whose payload is missing `orderId` degrades to
/// `Unknown` rather than failing the request: the contract with the
/// provider is to acknowledge everything that is not a forgery.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// Payment settled; drives the ledger and subscription activation.
    Confirmed {
        order_id: OrderId,
        payment_key: Option<String>,
        billing_key: Option<String>,
        amount: i64,
        raw: Value,
    },

    /// Payment attempt failed; only the ledger is authoritative.
    Failed {
        order_id: OrderId,
        failure_message: Option<String>,
        raw: Value,
    },

    /// Payment canceled; cancels the associated subscription if the
    /// order is known.
    Canceled {
        order_id: OrderId,
        cancel_reason: Option<String>,
        raw: Value,
    },

    /// Informational notice of a future auto-renewal attempt.
    BillingScheduled {
        customer_key: Option<String>,
        billing_date: Option<String>,
        raw: Value,
    },

    /// Anything we do not understand. Logged and acknowledged.
    Unknown { event_type: String, raw: Value },
}

impl ProviderEvent {
    /// Parses a raw (already signature-verified) request body.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` when the body is not a JSON object or the
    /// `eventType` field is missing. Unrecognized event types are NOT
    /// errors; they classify as `Unknown`.
    pub fn from_slice(body: &[u8]) -> Result<Self, ParseError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| ParseError(e.to_string()))?;

        if !raw.is_object() {
            return Err(ParseError("payload is not a JSON object".to_string()));
        }

        let event_type = raw
            .get("eventType")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError("missing eventType field".to_string()))?
            .to_string();

        Ok(Self::classify(event_type, raw))
    }

    fn classify(event_type: String, raw: Value) -> Self {
        let order_id = raw
            .get("orderId")
            .and_then(Value::as_str)
            .and_then(|s| OrderId::new(s).ok());

        match (event_type.as_str(), order_id) {
            (EVENT_PAYMENT_CONFIRMED, Some(order_id)) => ProviderEvent::Confirmed {
                order_id,
                payment_key: string_field(&raw, "paymentKey"),
                billing_key: string_field(&raw, "billingKey"),
                amount: raw.get("totalAmount").and_then(Value::as_i64).unwrap_or(0),
                raw,
            },
            (EVENT_PAYMENT_FAILED, Some(order_id)) => ProviderEvent::Failed {
                order_id,
                failure_message: string_field(&raw, "failureMessage"),
                raw,
            },
            (EVENT_PAYMENT_CANCELED, Some(order_id)) => ProviderEvent::Canceled {
                order_id,
                cancel_reason: string_field(&raw, "cancelReason"),
                raw,
            },
            (EVENT_BILLING_SCHEDULED, _) => ProviderEvent::BillingScheduled {
                customer_key: string_field(&raw, "customerKey"),
                billing_date: string_field(&raw, "billingDate"),
                raw,
            },
            // A payment event without a usable orderId cannot be
            // ledgered; acknowledge it like any other unknown.
            (_, _) => ProviderEvent::Unknown {
                event_type: event_type.clone(),
                raw,
            },
        }
    }

    /// Returns the wire event-kind string.
    pub fn kind(&self) -> &str {
        match self {
            ProviderEvent::Confirmed { .. } => EVENT_PAYMENT_CONFIRMED,
            ProviderEvent::Failed { .. } => EVENT_PAYMENT_FAILED,
            ProviderEvent::Canceled { .. } => EVENT_PAYMENT_CANCELED,
            ProviderEvent::BillingScheduled { .. } => EVENT_BILLING_SCHEDULED,
            ProviderEvent::Unknown { event_type, .. } => event_type,
        }
    }

    /// Returns the raw payload for audit storage and logging.
    pub fn raw(&self) -> &Value {
        match self {
            ProviderEvent::Confirmed { raw, .. }
            | ProviderEvent::Failed { raw, .. }
            | ProviderEvent::Canceled { raw, .. }
            | ProviderEvent::BillingScheduled { raw, .. }
            | ProviderEvent::Unknown { raw, .. } => raw,
        }
    }

    /// Returns the order identifier for kinds that carry one.
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            ProviderEvent::Confirmed { order_id, .. }
            | ProviderEvent::Failed { order_id, .. }
            | ProviderEvent::Canceled { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}
