//! SubscriptionStore port - Per-user subscription lifecycle mutations.
//!
//! At most one subscription row exists per user. Activation is an
//! upsert keyed by `user_id`; cancellation and failed-attempt
//! accounting are conditional updates that do nothing for unknown
//! users. All mutations must be single atomic statements for the same
//! redelivery reasons as the payment ledger.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Write model for a subscription activation.
#[derive(Debug, Clone)]
pub struct ActivateSubscription {
    /// User the confirmed payment belongs to.
    pub user_id: UserId,

    /// Plan decoded from the order identifier.
    pub plan_name: String,

    /// Saved payment-method token, when the payload carried one.
    /// Preserved if `None` on re-activation.
    pub billing_key: Option<String>,

    /// Start of the paid window.
    pub start_date: Timestamp,

    /// End of the paid window.
    pub end_date: Timestamp,
}

/// Port for the subscription store.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Creates or re-activates the user's subscription: status becomes
    /// active, the renewal window is stamped, cancellation fields are
    /// cleared, and `failed_payment_count` resets to zero.
    async fn activate(
        &self,
        activation: ActivateSubscription,
    ) -> Result<SubscriptionRecord, DomainError>;

    /// Cancels the user's subscription regardless of current state,
    /// stamping `cancelled_at` and keeping plan and history intact.
    /// Returns `None` when the user has no subscription row.
    async fn cancel(
        &self,
        user_id: &UserId,
        reason: Option<String>,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Increments `failed_payment_count` and stamps
    /// `last_payment_attempt` without touching status. A no-op for
    /// users with no subscription row.
    async fn record_failed_attempt(&self, user_id: &UserId) -> Result<(), DomainError>;

    /// Looks up the user's subscription.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;
}
