//! Billing domain module.
//!
//! Models the payment-provider webhook stream and the state it drives:
//! the payment ledger and the per-user subscription lifecycle.
//!
//! # Module Structure
//!
//! - `order_ref` - Decoder for the structured order identifier
//! - `provider_event` - Typed envelope for webhook payloads
//! - `payment_record` - Payment ledger entry and status lifecycle
//! - `subscription` - Subscription record and status lifecycle
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `webhook_errors` - Error taxonomy and response-code contract
//! - `redact` - Sensitive-field masking for payload logging

mod order_ref;
mod payment_record;
mod provider_event;
mod redact;
mod subscription;
mod webhook_errors;
mod webhook_verifier;

pub use order_ref::{OrderRef, OrderRefError, BASELINE_PLAN};
pub use payment_record::{PaymentRecord, PaymentStatus};
pub use provider_event::{ParseError, ProviderEvent};
pub use redact::redact;
pub use subscription::{
    renewal_window_end, SubscriptionRecord, SubscriptionStatus, RENEWAL_PERIOD_DAYS,
};
pub use webhook_errors::{AckStatus, WebhookError};
pub use webhook_verifier::{SignatureError, WebhookVerifier};
