//! Axum router configuration for the webhook endpoint.
//!
//! Webhook routes carry no user authentication; deliveries are
//! authenticated by the signature header instead.

use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers::{handle_provider_webhook, WebhookAppState};

/// Create the webhook route tree.
///
/// # Routes
/// - `POST /payment-provider` - Handle payment-provider deliveries
///
/// CORS preflight (`OPTIONS`) is answered by a permissive layer; the
/// provider itself never preflights, this only keeps dashboard tooling
/// from tripping over the endpoint.
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/payment-provider", post(handle_provider_webhook))
        .layer(CorsLayer::permissive())
}

/// Create the complete webhook module router.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use bidwatch::adapters::http::webhook::{webhook_router, WebhookAppState};
///
/// let state = WebhookAppState { /* ... */ };
/// let app = Router::new().merge(webhook_router()).with_state(state);
/// ```
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().nest("/webhooks", webhook_routes())
}
