//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx-backed implementations of the store ports
//! - `http` - axum routes and handlers for the webhook endpoint

pub mod http;
pub mod postgres;
