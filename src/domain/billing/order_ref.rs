//! Decoder for the structured order identifier.
//!
//! Order identifiers issued at checkout follow the format
//! `{prefix}-{user_id}-{plan}-{timestamp}`. The provider treats the
//! whole string as opaque; the webhook side decodes it to recover the
//! user and plan a payment belongs to.
//!
//! Malformed identifiers must fail closed: the caller treats a parse
//! failure as "user unknown" and still writes the ledger entry.

use thiserror::Error;

use crate::domain::foundation::UserId;

/// Plan used when the order identifier carries no plan segment.
pub const BASELINE_PLAN: &str = "basic";

/// Structured view of an order identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRef {
    /// User the order was created for.
    pub user_id: UserId,

    /// Plan segment, lowercased. `"basic"` when the segment is absent.
    pub plan: String,
}

/// Errors that occur while decoding an order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRefError {
    /// Identifier does not split into at least `{prefix}-{user_id}`.
    #[error("order id '{0}' has too few segments")]
    TooFewSegments(String),

    /// The user-id segment is not an integer.
    #[error("order id user segment '{0}' is not an integer")]
    InvalidUserId(String),
}

impl OrderRef {
    /// Parses an order identifier of the form
    /// `{prefix}-{user_id}-{plan}-{timestamp}`.
    ///
    /// The prefix and timestamp segments are not interpreted. A missing
    /// plan segment defaults to [`BASELINE_PLAN`]; anything else is
    /// preserved lowercased.
    ///
    /// # Errors
    ///
    /// Returns `OrderRefError` if there are fewer than two segments or
    /// the user-id segment is not an integer.
    pub fn parse(order_id: &str) -> Result<Self, OrderRefError> {
        let mut segments = order_id.split('-');
        let _prefix = segments.next();

        let user_segment = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OrderRefError::TooFewSegments(order_id.to_string()))?;

        let user_id: i64 = user_segment
            .parse()
            .map_err(|_| OrderRefError::InvalidUserId(user_segment.to_string()))?;

        let plan = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| BASELINE_PLAN.to_string());

        Ok(OrderRef {
            user_id: UserId::new(user_id),
            plan,
        })
    }
}
