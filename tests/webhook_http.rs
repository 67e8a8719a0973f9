//! Integration tests for the payment-provider webhook endpoint.
//!
//! These tests drive the axum router end-to-end with in-memory store
//! implementations and verify the delivery contract:
//! 1. Idempotence of redelivered events
//! 2. Signature verification over the exact raw body
//! 3. The 200/401 response-code contract
//! 4. Out-of-order cancellation tolerance

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::RwLock;
use tower::ServiceExt;

use bidwatch::adapters::http::webhook::{webhook_router, WebhookAppState, SIGNATURE_HEADER};
use bidwatch::domain::billing::{
    PaymentRecord, PaymentStatus, SubscriptionRecord, SubscriptionStatus, WebhookVerifier,
};
use bidwatch::domain::foundation::{DomainError, OrderId, Timestamp, UserId};
use bidwatch::ports::{ActivateSubscription, PaymentLedger, PaymentUpsert, SubscriptionStore};

const TEST_SECRET: &str = "whk_integration_secret";
const WEBHOOK_PATH: &str = "/webhooks/payment-provider";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory payment ledger honoring the upsert contract.
struct InMemoryPaymentLedger {
    records: RwLock<HashMap<String, PaymentRecord>>,
    fail_writes: bool,
}

impl InMemoryPaymentLedger {
    fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fail_writes: false,
        }
    }

    fn failing() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fail_writes: true,
        }
    }

    async fn record(&self, order_id: &str) -> Option<PaymentRecord> {
        self.records.read().await.get(order_id).cloned()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn upsert(&self, record: PaymentUpsert) -> Result<PaymentRecord, DomainError> {
        if self.fail_writes {
            return Err(DomainError::database("ledger unavailable"));
        }
        let mut records = self.records.write().await;
        let now = Timestamp::now();
        let stored = match records.get(record.order_id.as_str()) {
            Some(existing) => PaymentRecord {
                order_id: record.order_id.clone(),
                payment_key: record.payment_key.or_else(|| existing.payment_key.clone()),
                user_id: record.user_id.or(existing.user_id),
                amount: record.amount.unwrap_or(existing.amount),
                status: record.status,
                raw_event: record.raw_event,
                created_at: existing.created_at,
                updated_at: now,
            },
            None => PaymentRecord {
                order_id: record.order_id.clone(),
                payment_key: record.payment_key,
                user_id: record.user_id,
                amount: record.amount.unwrap_or(0),
                status: record.status,
                raw_event: record.raw_event,
                created_at: now,
                updated_at: now,
            },
        };
        records.insert(stored.order_id.as_str().to_string(), stored.clone());
        Ok(stored)
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.records.read().await.get(order_id.as_str()).cloned())
    }

    async fn mark_canceled(
        &self,
        order_id: &OrderId,
        raw_event: Value,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        if self.fail_writes {
            return Err(DomainError::database("ledger unavailable"));
        }
        let mut records = self.records.write().await;
        match records.get_mut(order_id.as_str()) {
            Some(existing) => {
                existing.status = PaymentStatus::Canceled;
                existing.raw_event = raw_event;
                existing.updated_at = Timestamp::now();
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }
}

/// In-memory subscription store honoring the one-row-per-user contract.
struct InMemorySubscriptionStore {
    records: RwLock<HashMap<i64, SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    async fn record(&self, user_id: i64) -> Option<SubscriptionRecord> {
        self.records.read().await.get(&user_id).cloned()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn activate(
        &self,
        activation: ActivateSubscription,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut records = self.records.write().await;
        let now = Timestamp::now();
        let existing = records.get(&activation.user_id.as_i64());
        let stored = SubscriptionRecord {
            user_id: activation.user_id,
            plan_name: activation.plan_name,
            status: SubscriptionStatus::Active,
            billing_key: activation
                .billing_key
                .or_else(|| existing.and_then(|e| e.billing_key.clone())),
            start_date: activation.start_date,
            end_date: activation.end_date,
            cancelled_at: None,
            cancel_reason: None,
            failed_payment_count: 0,
            last_payment_attempt: Some(activation.start_date),
            created_at: existing.map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
        };
        records.insert(stored.user_id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn cancel(
        &self,
        user_id: &UserId,
        reason: Option<String>,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(&user_id.as_i64()) {
            Some(existing) => {
                existing.status = SubscriptionStatus::Canceled;
                existing.cancelled_at = Some(Timestamp::now());
                existing.cancel_reason = reason;
                existing.updated_at = Timestamp::now();
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn record_failed_attempt(&self, user_id: &UserId) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get_mut(&user_id.as_i64()) {
            existing.failed_payment_count += 1;
            existing.last_payment_attempt = Some(Timestamp::now());
            existing.updated_at = Timestamp::now();
        }
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.records.read().await.get(&user_id.as_i64()).cloned())
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

struct TestApp {
    router: Router,
    ledger: Arc<InMemoryPaymentLedger>,
    subscriptions: Arc<InMemorySubscriptionStore>,
}

fn test_app() -> TestApp {
    test_app_with(
        Arc::new(InMemoryPaymentLedger::new()),
        WebhookVerifier::with_secret(TEST_SECRET),
    )
}

fn test_app_with(ledger: Arc<InMemoryPaymentLedger>, verifier: WebhookVerifier) -> TestApp {
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let state = WebhookAppState {
        ledger: ledger.clone(),
        subscriptions: subscriptions.clone(),
        verifier: Arc::new(verifier),
    };
    TestApp {
        router: webhook_router().with_state(state),
        ledger,
        subscriptions,
    }
}

/// Signs a body the way the provider does: hex HMAC-SHA256 of the raw bytes.
fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes())
        .expect("HMAC accepts any key");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn signed_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign(body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn confirmed_body(order_id: &str, amount: i64) -> String {
    json!({
        "eventType": "payment.confirmed",
        "orderId": order_id,
        "paymentKey": "pk_test_key",
        "totalAmount": amount
    })
    .to_string()
}

// =============================================================================
// End-to-End Scenarios
// =============================================================================

#[tokio::test]
async fn confirmed_payment_activates_subscription() {
    let app = test_app();
    let body = confirmed_body("BIZ-7-BASIC-20260301120000", 10000);

    let (status, ack) = send(&app, signed_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["event"], "payment.confirmed");

    let payment = app.ledger.record("BIZ-7-BASIC-20260301120000").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.user_id, Some(UserId::new(7)));
    assert_eq!(payment.amount, 10000);

    let sub = app.subscriptions.record(7).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.plan_name, "basic");

    // end_date is approximately 30 days out
    let now = Timestamp::now();
    assert!(sub.end_date.is_after(&now.add_days(29)));
    assert!(now.add_days(31).is_after(&sub.end_date));
}

#[tokio::test]
async fn corrupted_signature_is_rejected_without_mutation() {
    let app = test_app();
    let body = confirmed_body("BIZ-7-BASIC-20260301120000", 10000);
    let mut signature = sign(body.as_bytes());
    // Flip one hex digit.
    let last = if signature.ends_with('0') { "1" } else { "0" };
    signature.replace_range(signature.len() - 1.., last);

    let request = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();
    let (status, ack) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ack["status"], "error");
    assert_eq!(app.ledger.len().await, 0);
    assert_eq!(app.subscriptions.len().await, 0);
}

#[tokio::test]
async fn cancellation_cancels_payment_and_subscription() {
    let app = test_app();
    let order_id = "BIZ-7-BASIC-20260301120000";
    send(&app, signed_request(&confirmed_body(order_id, 10000))).await;

    let cancel_body = json!({
        "eventType": "payment.canceled",
        "orderId": order_id,
        "cancelReason": "user request"
    })
    .to_string();
    let (status, ack) = send(&app, signed_request(&cancel_body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");

    let payment = app.ledger.record(order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Canceled);

    let sub = app.subscriptions.record(7).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Canceled);
    assert_eq!(sub.cancel_reason.as_deref(), Some("user request"));
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn redelivered_confirmation_creates_exactly_one_record() {
    let app = test_app();
    let body = confirmed_body("BIZ-42-PRO-20260101", 29000);

    for _ in 0..5 {
        let (status, _) = send(&app, signed_request(&body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.ledger.len().await, 1);
    let payment = app.ledger.record("BIZ-42-PRO-20260101").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(app.subscriptions.len().await, 1);
}

// =============================================================================
// Out-of-Order Delivery
// =============================================================================

#[tokio::test]
async fn cancellation_of_unknown_order_is_acknowledged_without_writes() {
    let app = test_app();
    let body = json!({
        "eventType": "payment.canceled",
        "orderId": "BIZ-99-PRO-20270101"
    })
    .to_string();

    let (status, ack) = send(&app, signed_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
    // No ledger row invented for an unconfirmed payment.
    assert_eq!(app.ledger.len().await, 0);
    assert_eq!(app.subscriptions.len().await, 0);
}

// =============================================================================
// Response Contract
// =============================================================================

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let app = test_app();
    let body = confirmed_body("BIZ-7-BASIC-1", 10000);

    let request = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_acknowledged_as_ignored() {
    let app = test_app();
    let body = "{definitely not json";

    let (status, ack) = send(&app, signed_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "ignored");
    assert_eq!(app.ledger.len().await, 0);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged_without_mutation() {
    let app = test_app();
    let body = json!({
        "eventType": "merchant.settlement.completed",
        "orderId": "BIZ-7-BASIC-1"
    })
    .to_string();

    let (status, ack) = send(&app, signed_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["event"], "merchant.settlement.completed");
    assert_eq!(app.ledger.len().await, 0);
    assert_eq!(app.subscriptions.len().await, 0);
}

#[tokio::test]
async fn missing_secret_acknowledges_without_processing() {
    let app = test_app_with(
        Arc::new(InMemoryPaymentLedger::new()),
        WebhookVerifier::new(None),
    );
    let body = confirmed_body("BIZ-7-BASIC-1", 10000);

    let (status, ack) = send(&app, signed_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "ignored");
    assert_eq!(app.ledger.len().await, 0);
}

#[tokio::test]
async fn persistence_failure_is_still_acknowledged() {
    let app = test_app_with(
        Arc::new(InMemoryPaymentLedger::failing()),
        WebhookVerifier::with_secret(TEST_SECRET),
    );
    let body = confirmed_body("BIZ-7-BASIC-1", 10000);

    let (status, ack) = send(&app, signed_request(&body)).await;

    // The provider must never see a retryable response for an internal
    // failure.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "error");
}

#[tokio::test]
async fn failed_payment_does_not_change_subscription_status() {
    let app = test_app();
    send(&app, signed_request(&confirmed_body("BIZ-7-BASIC-1", 10000))).await;

    let failed_body = json!({
        "eventType": "payment.failed",
        "orderId": "BIZ-7-BASIC-2",
        "failureMessage": "insufficient funds"
    })
    .to_string();
    let (status, _) = send(&app, signed_request(&failed_body)).await;

    assert_eq!(status, StatusCode::OK);
    let sub = app.subscriptions.record(7).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.failed_payment_count, 1);
    assert_eq!(
        app.ledger.record("BIZ-7-BASIC-2").await.unwrap().status,
        PaymentStatus::Failed
    );
}

#[tokio::test]
async fn unparsable_order_id_is_ledgered_without_subscription() {
    let app = test_app();
    let body = confirmed_body("not-a-valid-id", 5000);

    let (status, ack) = send(&app, signed_request(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
    let payment = app.ledger.record("not-a-valid-id").await.unwrap();
    assert_eq!(payment.user_id, None);
    assert_eq!(app.subscriptions.len().await, 0);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = test_app();

    let request = Request::builder()
        .method("OPTIONS")
        .uri(WEBHOOK_PATH)
        .header("Origin", "https://dashboard.example.com")
        .header("Access-Control-Request-Method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
