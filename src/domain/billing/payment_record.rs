//! Payment ledger entry.
//!
//! One record per provider order identifier. Records are created on the
//! first event for an order and overwritten in place by every later
//! event for the same order; they are never deleted. The raw payload of
//! the last delivery is kept for audit and replay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{OrderId, StateMachine, Timestamp, UserId};

/// Payment attempt status in the provider lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Attempt observed but not yet settled.
    Pending,

    /// Provider confirmed the charge.
    Completed,

    /// Provider reported the attempt failed.
    Failed,

    /// Payment canceled after the fact.
    Canceled,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Canceled)
            // From FAILED (provider may retry the charge)
                | (Failed, Completed)
                | (Failed, Failed)
                | (Failed, Canceled)
            // From COMPLETED
                | (Completed, Completed) // redelivery
                | (Completed, Canceled)
            // From CANCELED
                | (Canceled, Canceled) // redelivery
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed, Canceled],
            Failed => vec![Completed, Failed, Canceled],
            Completed => vec![Completed, Canceled],
            Canceled => vec![Canceled],
        }
    }
}

/// One row of the payment ledger, keyed by order identifier.
///
/// # Invariants
///
/// - `order_id` is globally unique; redelivery overwrites, never
///   duplicates.
/// - `user_id` is `None` when the order identifier did not decode.
/// - `raw_event` holds the payload of the most recent delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// Provider-issued order identifier (unique key).
    pub order_id: OrderId,

    /// Opaque provider payment reference, set once confirmed.
    pub payment_key: Option<String>,

    /// User recovered from the order identifier, if it decoded.
    pub user_id: Option<UserId>,

    /// Amount in the minor currency unit.
    pub amount: i64,

    /// Current attempt status.
    pub status: PaymentStatus,

    /// Raw payload of the last event received for this order.
    pub raw_event: Value,

    /// When the first event for this order was recorded.
    pub created_at: Timestamp,

    /// When the most recent event for this order was recorded.
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Status Lifecycle Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn pending_can_complete_fail_or_cancel() {
        let status = PaymentStatus::Pending;

        assert!(status.can_transition_to(&PaymentStatus::Completed));
        assert!(status.can_transition_to(&PaymentStatus::Failed));
        assert!(status.can_transition_to(&PaymentStatus::Canceled));
    }

    #[test]
    fn failed_attempt_can_recover_to_completed() {
        let status = PaymentStatus::Failed;

        assert_eq!(
            status.transition_to(PaymentStatus::Completed),
            Ok(PaymentStatus::Completed)
        );
    }

    #[test]
    fn completed_can_be_canceled() {
        let status = PaymentStatus::Completed;

        assert_eq!(
            status.transition_to(PaymentStatus::Canceled),
            Ok(PaymentStatus::Canceled)
        );
    }

    #[test]
    fn canceled_does_not_recover() {
        let status = PaymentStatus::Canceled;

        assert!(!status.can_transition_to(&PaymentStatus::Completed));
        assert!(status.transition_to(PaymentStatus::Pending).is_err());
    }

    #[test]
    fn redelivery_of_terminal_statuses_is_modeled() {
        assert!(PaymentStatus::Completed.can_transition_to(&PaymentStatus::Completed));
        assert!(PaymentStatus::Canceled.can_transition_to(&PaymentStatus::Canceled));
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Canceled,
        ] {
            for valid_target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&valid_target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    valid_target
                );
            }
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let parsed: PaymentStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Canceled);
    }
}
