//! Subscription record and lifecycle.
//!
//! Each user has at most one subscription row, created implicitly by
//! the first successful payment and mutated by every relevant payment
//! event afterwards. Rows are never deleted; cancellation keeps the
//! plan and history intact for audit.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, Timestamp, UserId};

/// Length of the renewal window stamped on activation.
///
/// The provider's events carry no billing-cycle metadata, so the window
/// is fixed rather than derived from the payload.
pub const RENEWAL_PERIOD_DAYS: i64 = 30;

/// Subscription status in the billing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No paid access. Default state before any confirmed payment.
    Inactive,

    /// Paid access within the current renewal window.
    Active,

    /// Canceled. Terminal until a new confirmed payment re-activates.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true if this status grants paid access.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From INACTIVE
            (Inactive, Active)
                | (Inactive, Canceled)
            // From ACTIVE
                | (Active, Active) // renewal
                | (Active, Canceled)
            // From CANCELED (cancellation is idempotent; a new
            // confirmed payment re-activates)
                | (Canceled, Canceled)
                | (Canceled, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Inactive => vec![Active, Canceled],
            Active => vec![Active, Canceled],
            Canceled => vec![Canceled, Active],
        }
    }
}

/// One subscription row, keyed by user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    /// Owner of the subscription (one row per user).
    pub user_id: UserId,

    /// Plan decoded from the order identifier at activation.
    pub plan_name: String,

    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// Saved payment-method token for auto-renewal charges.
    pub billing_key: Option<String>,

    /// Start of the current paid window.
    pub start_date: Timestamp,

    /// End of the current paid window.
    pub end_date: Timestamp,

    /// When the subscription was canceled, if it was.
    pub cancelled_at: Option<Timestamp>,

    /// Provider-supplied cancellation reason, if any.
    pub cancel_reason: Option<String>,

    /// Consecutive failed payment attempts; reset on success.
    pub failed_payment_count: i32,

    /// When the provider last reported a payment attempt.
    pub last_payment_attempt: Option<Timestamp>,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last mutated.
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// Returns true if the subscription grants access at `now`.
    pub fn has_access(&self, now: Timestamp) -> bool {
        self.status.is_active() && self.end_date.is_after(&now)
    }
}

/// Computes the renewal window end for an activation at `start`.
pub fn renewal_window_end(start: Timestamp) -> Timestamp {
    start.add_days(RENEWAL_PERIOD_DAYS)
}
