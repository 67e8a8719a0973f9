//! PostgreSQL implementation of the SubscriptionStore port.
//!
//! The `subscriptions` table is keyed by `user_id` (at most one
//! subscription per user). Activation is a native upsert; cancellation
//! and failed-attempt accounting are conditional updates that leave
//! unknown users untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{ActivateSubscription, SubscriptionStore};

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: i64,
    plan_name: String,
    status: String,
    billing_key: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancel_reason: Option<String>,
    failed_payment_count: i32,
    last_payment_attempt: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            user_id: UserId::new(row.user_id),
            plan_name: row.plan_name,
            status: parse_status(&row.status)?,
            billing_key: row.billing_key,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            cancel_reason: row.cancel_reason,
            failed_payment_count: row.failed_payment_count,
            last_payment_attempt: row.last_payment_attempt.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "inactive" => Ok(SubscriptionStatus::Inactive),
        "active" => Ok(SubscriptionStatus::Active),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

const SUBSCRIPTION_COLUMNS: &str = "user_id, plan_name, status, billing_key, start_date, \
     end_date, cancelled_at, cancel_reason, failed_payment_count, last_payment_attempt, \
     created_at, updated_at";

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn activate(
        &self,
        activation: ActivateSubscription,
    ) -> Result<SubscriptionRecord, DomainError> {
        let row: SubscriptionRow = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (
                user_id, plan_name, status, billing_key, start_date, end_date,
                cancelled_at, cancel_reason, failed_payment_count, last_payment_attempt,
                created_at, updated_at
            ) VALUES ($1, $2, 'active', $3, $4, $5, NULL, NULL, 0, $4, now(), now())
            ON CONFLICT (user_id) DO UPDATE SET
                plan_name = EXCLUDED.plan_name,
                status = 'active',
                billing_key = COALESCE(EXCLUDED.billing_key, subscriptions.billing_key),
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                cancelled_at = NULL,
                cancel_reason = NULL,
                failed_payment_count = 0,
                last_payment_attempt = EXCLUDED.last_payment_attempt,
                updated_at = now()
            RETURNING user_id, plan_name, status, billing_key, start_date, end_date,
                cancelled_at, cancel_reason, failed_payment_count, last_payment_attempt,
                created_at, updated_at
            "#,
        )
        .bind(activation.user_id.as_i64())
        .bind(&activation.plan_name)
        .bind(&activation.billing_key)
        .bind(activation.start_date.as_datetime())
        .bind(activation.end_date.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to activate subscription: {}", e),
            )
            .with_detail("user_id", activation.user_id.to_string())
        })?;

        row.try_into()
    }

    async fn cancel(
        &self,
        user_id: &UserId,
        reason: Option<String>,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            UPDATE subscriptions SET
                status = 'canceled',
                cancelled_at = now(),
                cancel_reason = $2,
                updated_at = now()
            WHERE user_id = $1
            RETURNING user_id, plan_name, status, billing_key, start_date, end_date,
                cancelled_at, cancel_reason, failed_payment_count, last_payment_attempt,
                created_at, updated_at
            "#,
        )
        .bind(user_id.as_i64())
        .bind(&reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to cancel subscription: {}", e),
            )
            .with_detail("user_id", user_id.to_string())
        })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn record_failed_attempt(&self, user_id: &UserId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                failed_payment_count = failed_payment_count + 1,
                last_payment_attempt = now(),
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to record payment attempt: {}", e),
            )
        })?;

        // Zero rows affected means the user has no subscription yet;
        // nothing to account against.
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}
