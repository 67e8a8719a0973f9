//! Webhook HTTP adapter.
//!
//! Exposes `POST /webhooks/payment-provider` and enforces the response
//! contract: 401 only for signature failures, 200 for everything else.

mod dto;
mod handlers;
mod routes;

pub use dto::WebhookAck;
pub use handlers::{WebhookAppState, SIGNATURE_HEADER};
pub use routes::{webhook_router, webhook_routes};
