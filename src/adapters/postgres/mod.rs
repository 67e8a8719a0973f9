//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! All mutations are single atomic statements (`INSERT ... ON CONFLICT
//! DO UPDATE` or conditional `UPDATE ... RETURNING`) so concurrent
//! webhook redeliveries serialize at the storage layer instead of
//! racing in application code.

mod payment_ledger;
mod subscription_store;

pub use payment_ledger::PostgresPaymentLedger;
pub use subscription_store::PostgresSubscriptionStore;
