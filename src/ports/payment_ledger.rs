//! PaymentLedger port - Idempotent storage for payment attempts.
//!
//! The provider delivers events at-least-once, and two deliveries for
//! the same order may be processed concurrently by independent request
//! handlers. Implementations MUST make `upsert` a single atomic
//! insert-or-update-on-conflict operation, never a read-then-write: a
//! read-modify-write would lose updates or resurrect stale status under
//! concurrent redelivery.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::billing::{PaymentRecord, PaymentStatus};
use crate::domain::foundation::{DomainError, OrderId, UserId};

/// Write model for a ledger upsert.
///
/// Carries exactly the fields a redelivery is allowed to overwrite.
#[derive(Debug, Clone)]
pub struct PaymentUpsert {
    /// Provider order identifier (the unique key).
    pub order_id: OrderId,

    /// Provider payment reference; preserved if `None` on update.
    pub payment_key: Option<String>,

    /// User recovered from the order identifier; preserved if `None`.
    pub user_id: Option<UserId>,

    /// Amount in the minor currency unit; preserved if `None` (a
    /// failure report must not zero out the recorded charge).
    pub amount: Option<i64>,

    /// Status this event drives the record to.
    pub status: PaymentStatus,

    /// Raw payload of this delivery, stored for audit/replay.
    pub raw_event: Value,
}

impl PaymentUpsert {
    /// Builds the write for a `payment.confirmed` event.
    pub fn confirmed(
        order_id: OrderId,
        user_id: Option<UserId>,
        payment_key: Option<String>,
        amount: i64,
        raw_event: Value,
    ) -> Self {
        Self {
            order_id,
            payment_key,
            user_id,
            amount: Some(amount),
            status: PaymentStatus::Completed,
            raw_event,
        }
    }

    /// Builds the write for a `payment.failed` event. Only status and
    /// raw payload move; amount and payment key are left as recorded.
    pub fn failed(order_id: OrderId, user_id: Option<UserId>, raw_event: Value) -> Self {
        Self {
            order_id,
            payment_key: None,
            user_id,
            amount: None,
            status: PaymentStatus::Failed,
            raw_event,
        }
    }
}

/// Port for the payment ledger.
///
/// Implementations should rely on a database unique constraint on
/// `order_id` so concurrent upserts for the same order serialize at the
/// storage layer.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a new record for an unseen `order_id`, or atomically
    /// overwrites status/payment_key/raw_event and bumps `updated_at`
    /// for a known one. Returns the stored record.
    async fn upsert(&self, record: PaymentUpsert) -> Result<PaymentRecord, DomainError>;

    /// Looks up a ledger entry by order identifier.
    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentRecord>, DomainError>;

    /// Marks an existing order canceled and stores the cancellation
    /// payload. Returns `None` for an unknown order; a cancellation of
    /// an order never seen must NOT create a ledger row.
    async fn mark_canceled(
        &self,
        order_id: &OrderId,
        raw_event: Value,
    ) -> Result<Option<PaymentRecord>, DomainError>;
}
