//! ProcessPaymentEventHandler - Routes provider events to store mutations.
//!
//! One method per event kind. Everything here must tolerate duplicate
//! and out-of-order delivery: ledger writes are idempotent upserts, and
//! a cancellation for an order we have never seen degrades to a logged
//! no-op instead of an error.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::billing::{
    renewal_window_end, OrderRef, ProviderEvent, SubscriptionStatus, WebhookError,
};
use crate::domain::foundation::{OrderId, Timestamp, UserId};
use crate::ports::{ActivateSubscription, PaymentLedger, PaymentUpsert, SubscriptionStore};

/// Result of routing one provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessPaymentEventResult {
    /// Payment ledgered as completed; subscription activated when the
    /// order identifier yielded a user.
    PaymentCompleted {
        order_id: OrderId,
        user_id: Option<UserId>,
    },

    /// Payment ledgered as failed; subscription status untouched.
    PaymentFailed {
        order_id: OrderId,
        user_id: Option<UserId>,
    },

    /// Cancellation applied, or acknowledged for an unknown order.
    PaymentCanceled {
        order_id: OrderId,
        user_id: Option<UserId>,
    },

    /// Informational renewal notice; nothing persisted.
    RenewalScheduled,

    /// Unrecognized event kind; acknowledged, nothing persisted.
    Ignored { event_type: String },
}

/// Handler for provider webhook events.
///
/// Mutates the payment ledger and subscription store according to the
/// event kind. Signature verification and payload parsing happen
/// before this handler runs.
pub struct ProcessPaymentEventHandler {
    ledger: Arc<dyn PaymentLedger>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl ProcessPaymentEventHandler {
    pub fn new(ledger: Arc<dyn PaymentLedger>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            ledger,
            subscriptions,
        }
    }

    pub async fn handle(
        &self,
        event: ProviderEvent,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        match event {
            ProviderEvent::Confirmed {
                order_id,
                payment_key,
                billing_key,
                amount,
                raw,
            } => {
                self.handle_confirmed(order_id, payment_key, billing_key, amount, raw)
                    .await
            }
            ProviderEvent::Failed { order_id, raw, .. } => {
                self.handle_failed(order_id, raw).await
            }
            ProviderEvent::Canceled {
                order_id,
                cancel_reason,
                raw,
            } => self.handle_canceled(order_id, cancel_reason, raw).await,
            ProviderEvent::BillingScheduled {
                customer_key,
                billing_date,
                ..
            } => {
                info!(
                    customer_key = customer_key.as_deref().unwrap_or("-"),
                    billing_date = billing_date.as_deref().unwrap_or("-"),
                    "auto-renewal attempt scheduled by provider"
                );
                Ok(ProcessPaymentEventResult::RenewalScheduled)
            }
            ProviderEvent::Unknown { event_type, .. } => {
                info!(event = %event_type, "acknowledging unrecognized event kind");
                Ok(ProcessPaymentEventResult::Ignored { event_type })
            }
        }
    }

    async fn handle_confirmed(
        &self,
        order_id: OrderId,
        payment_key: Option<String>,
        billing_key: Option<String>,
        amount: i64,
        raw: Value,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        let order_ref = decode_order_ref(&order_id);
        let user_id = order_ref.as_ref().map(|r| r.user_id);

        let record = self
            .ledger
            .upsert(PaymentUpsert::confirmed(
                order_id.clone(),
                user_id,
                payment_key,
                amount,
                raw,
            ))
            .await?;

        match order_ref {
            Some(order_ref) => {
                let start = Timestamp::now();
                let subscription = self
                    .subscriptions
                    .activate(ActivateSubscription {
                        user_id: order_ref.user_id,
                        plan_name: order_ref.plan,
                        billing_key,
                        start_date: start,
                        end_date: renewal_window_end(start),
                    })
                    .await?;
                info!(
                    order_id = %record.order_id,
                    user_id = %subscription.user_id,
                    plan = %subscription.plan_name,
                    amount,
                    "payment confirmed, subscription activated"
                );
            }
            None => {
                info!(
                    order_id = %record.order_id,
                    amount,
                    "payment confirmed, ledgered without subscription update"
                );
            }
        }

        Ok(ProcessPaymentEventResult::PaymentCompleted { order_id, user_id })
    }

    async fn handle_failed(
        &self,
        order_id: OrderId,
        raw: Value,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        let user_id = decode_order_ref(&order_id).map(|r| r.user_id);

        self.ledger
            .upsert(PaymentUpsert::failed(order_id.clone(), user_id, raw))
            .await?;

        // Ledger is authoritative for failures; the subscription keeps
        // its status and only the attempt counters move.
        if let Some(user_id) = user_id {
            self.subscriptions.record_failed_attempt(&user_id).await?;
        }

        warn!(order_id = %order_id, "payment failed, ledgered");
        Ok(ProcessPaymentEventResult::PaymentFailed { order_id, user_id })
    }

    async fn handle_canceled(
        &self,
        order_id: OrderId,
        cancel_reason: Option<String>,
        raw: Value,
    ) -> Result<ProcessPaymentEventResult, WebhookError> {
        let record = self.ledger.mark_canceled(&order_id, raw).await?;

        let record = match record {
            Some(record) => record,
            None => {
                // Out-of-order delivery: the confirmation may not be
                // durable yet. Acknowledge without inventing a ledger
                // row for an unconfirmed payment.
                info!(order_id = %order_id, "cancellation for unknown order, nothing to do");
                return Ok(ProcessPaymentEventResult::PaymentCanceled {
                    order_id,
                    user_id: None,
                });
            }
        };

        if let Some(user_id) = record.user_id {
            match self.subscriptions.cancel(&user_id, cancel_reason).await? {
                Some(subscription) => {
                    debug_assert_eq!(subscription.status, SubscriptionStatus::Canceled);
                    info!(
                        order_id = %order_id,
                        user_id = %user_id,
                        "payment canceled, subscription canceled"
                    );
                }
                None => {
                    warn!(
                        order_id = %order_id,
                        user_id = %user_id,
                        "payment canceled but user has no subscription row"
                    );
                }
            }
        } else {
            info!(order_id = %order_id, "payment canceled, no user associated with order");
        }

        Ok(ProcessPaymentEventResult::PaymentCanceled {
            order_id,
            user_id: record.user_id,
        })
    }
}

/// Decodes the order identifier, mapping malformed identifiers to
/// "user unknown" instead of failing the event.
fn decode_order_ref(order_id: &OrderId) -> Option<OrderRef> {
    match OrderRef::parse(order_id.as_str()) {
        Ok(order_ref) => Some(order_ref),
        Err(err) => {
            warn!(order_id = %order_id, error = %err, "order id did not decode");
            None
        }
    }
}
