//! Bidwatch backend entry point.
//!
//! Boots the webhook subsystem: configuration, tracing, the PostgreSQL
//! pool, and the axum server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use bidwatch::adapters::http::webhook::{webhook_router, WebhookAppState};
use bidwatch::adapters::postgres::{PostgresPaymentLedger, PostgresSubscriptionStore};
use bidwatch::config::AppConfig;
use bidwatch::domain::billing::WebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!().run(&pool).await?;
    }

    let verifier = WebhookVerifier::new(config.payment.webhook_secret.clone());
    if !verifier.is_configured() {
        // The endpoint will acknowledge-and-ignore every delivery until
        // a secret is deployed; make sure an operator sees this.
        error!("webhook secret is not configured; deliveries will be acknowledged but not processed");
    }

    let state = WebhookAppState {
        ledger: Arc::new(PostgresPaymentLedger::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionStore::new(pool)),
        verifier: Arc::new(verifier),
    };

    let app = webhook_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "bidwatch webhook service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
