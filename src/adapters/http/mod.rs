//! HTTP adapters - REST API implementations.
//!
//! The webhook endpoint is the only HTTP surface of this subsystem; it
//! is authenticated by signature, not by user session.

pub mod webhook;

pub use webhook::{webhook_router, WebhookAppState};
