//! PostgreSQL implementation of the PaymentLedger port.
//!
//! The `payments` table is keyed by `order_id`; idempotence under
//! at-least-once delivery rests on the primary key plus native upserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::billing::{PaymentRecord, PaymentStatus};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, UserId};
use crate::ports::{PaymentLedger, PaymentUpsert};

/// PostgreSQL implementation of the PaymentLedger port.
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    /// Creates a new ledger backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    order_id: String,
    payment_key: Option<String>,
    user_id: Option<i64>,
    amount: i64,
    status: String,
    raw_event: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            order_id: OrderId::new(row.order_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid order_id: {}", e))
            })?,
            payment_key: row.payment_key,
            user_id: row.user_id.map(UserId::new),
            amount: row.amount,
            status: parse_status(&row.status)?,
            raw_event: row.raw_event,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        "canceled" => Ok(PaymentStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

fn status_to_string(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Canceled => "canceled",
    }
}

const PAYMENT_COLUMNS: &str =
    "order_id, payment_key, user_id, amount, status, raw_event, created_at, updated_at";

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn upsert(&self, record: PaymentUpsert) -> Result<PaymentRecord, DomainError> {
        // NULL parameters mean "preserve what is recorded"; COALESCE
        // applies that both on first insert and on redelivery update.
        let row: PaymentRow = sqlx::query_as(
            r#"
            INSERT INTO payments (
                order_id, payment_key, user_id, amount, status, raw_event, created_at, updated_at
            ) VALUES ($1, $2, $3, COALESCE($4, 0), $5, $6, now(), now())
            ON CONFLICT (order_id) DO UPDATE SET
                payment_key = COALESCE($2, payments.payment_key),
                user_id = COALESCE($3, payments.user_id),
                amount = COALESCE($4, payments.amount),
                status = EXCLUDED.status,
                raw_event = EXCLUDED.raw_event,
                updated_at = now()
            RETURNING order_id, payment_key, user_id, amount, status, raw_event, created_at, updated_at
            "#,
        )
        .bind(record.order_id.as_str())
        .bind(&record.payment_key)
        .bind(record.user_id.map(|id| id.as_i64()))
        .bind(record.amount)
        .bind(status_to_string(&record.status))
        .bind(&record.raw_event)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to upsert payment: {}", e))
                .with_detail("order_id", record.order_id.as_str())
        })?;

        row.try_into()
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE order_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
        })?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn mark_canceled(
        &self,
        order_id: &OrderId,
        raw_event: Value,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        // Update-only: a cancellation of an order never seen must not
        // create a ledger row for an unconfirmed payment.
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            UPDATE payments SET
                status = 'canceled',
                raw_event = $2,
                updated_at = now()
            WHERE order_id = $1
            RETURNING order_id, payment_key, user_id, amount, status, raw_event, created_at, updated_at
            "#,
        )
        .bind(order_id.as_str())
        .bind(&raw_event)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to cancel payment: {}", e))
                .with_detail("order_id", order_id.as_str())
        })?;

        row.map(PaymentRecord::try_from).transpose()
    }
}
