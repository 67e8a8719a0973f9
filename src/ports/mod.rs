//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Ports
//!
//! - `PaymentLedger` - Idempotent, upsert-based payment ledger keyed by
//!   the provider order identifier
//! - `SubscriptionStore` - Per-user subscription lifecycle mutations

mod payment_ledger;
mod subscription_store;

pub use payment_ledger::{PaymentLedger, PaymentUpsert};
pub use subscription_store::{ActivateSubscription, SubscriptionStore};
