//! Integration test harness for the Driftpress checkout backend.
//!
//! Provides a [`TestContext`] wiring the real store, orchestrator, and
//! routers to an in-memory SQLite database and fake external clients, so
//! whole checkout flows run without network access.
//!
//! # Test Categories
//!
//! - `cart_store` - Store invariants against in-memory SQLite
//! - `checkout_flow` - Orchestrator state machine with fakes
//! - `site_api` - Router-level tests for the session/cart endpoints
//! - `webhook_receiver` - Signature verification and terminal transitions

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use std::sync::Arc;

use driftpress_checkout::config::{CheckoutConfig, FulfillmentConfig, StripeConfig};
use driftpress_checkout::db::{self, CartStore};
use driftpress_checkout::services::fulfillment::{
    FulfillmentError, FulfillmentProvider, OrderDraft, OrderSubmission, PayerInfo,
};
use driftpress_checkout::services::payments::{PaymentError, PaymentGateway, PaymentIntent};
use driftpress_checkout::state::AppState;
use driftpress_core::{Catalog, ShippingAddress};

/// Webhook signing secret used by the test configuration.
pub const WEBHOOK_SECRET: &str = "whsec_1f2e3d4c5b6a79880917";

/// Payment gateway fake: intents live in a map, amounts update in place.
#[derive(Default)]
pub struct FakeGateway {
    pub create_calls: Mutex<u32>,
    pub amounts: Mutex<HashMap<String, i64>>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current amount held against an intent id.
    pub fn amount_of(&self, intent_id: &str) -> Option<i64> {
        self.amounts.lock().expect("gateway lock").get(intent_id).copied()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        let mut calls = self.create_calls.lock().expect("gateway lock");
        *calls += 1;
        let id = format!("pi_test_{calls}");
        self.amounts
            .lock()
            .expect("gateway lock")
            .insert(id.clone(), amount);

        Ok(PaymentIntent {
            client_secret: format!("{id}_secret_abcdef"),
            id,
            status: "requires_payment_method".to_owned(),
            amount,
        })
    }

    async fn update_intent_amount(
        &self,
        intent_id: &str,
        amount: i64,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut amounts = self.amounts.lock().expect("gateway lock");
        let Some(stored) = amounts.get_mut(intent_id) else {
            return Err(PaymentError::Api {
                status: 404,
                message: format!("no such intent {intent_id}"),
            });
        };
        *stored = amount;

        Ok(PaymentIntent {
            id: intent_id.to_owned(),
            client_secret: format!("{intent_id}_secret_abcdef"),
            status: "requires_payment_method".to_owned(),
            amount,
        })
    }
}

/// Fulfillment fake: programmable quote, recorded submissions.
pub struct FakeProvider {
    pub shipping_cost: i64,
    pub fail_quotes: Mutex<u32>,
    pub fail_submissions: AtomicBool,
    pub submissions: Mutex<Vec<OrderSubmission>>,
}

impl FakeProvider {
    #[must_use]
    pub fn new(shipping_cost: i64) -> Self {
        Self {
            shipping_cost,
            fail_quotes: Mutex::new(0),
            fail_submissions: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().expect("provider lock").len()
    }

    pub fn last_submission(&self) -> Option<OrderSubmission> {
        self.submissions.lock().expect("provider lock").last().cloned()
    }
}

#[async_trait]
impl FulfillmentProvider for FakeProvider {
    async fn estimate_shipping(&self, _draft: &OrderDraft) -> Result<i64, FulfillmentError> {
        let mut failures = self.fail_quotes.lock().expect("provider lock");
        if *failures > 0 {
            *failures -= 1;
            return Err(FulfillmentError::Api {
                status: 500,
                message: "quote unavailable".to_owned(),
            });
        }
        Ok(self.shipping_cost)
    }

    async fn submit_order(&self, order: &OrderSubmission) -> Result<(), FulfillmentError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(FulfillmentError::Api {
                status: 500,
                message: "order rejected".to_owned(),
            });
        }
        self.submissions
            .lock()
            .expect("provider lock")
            .push(order.clone());
        Ok(())
    }
}

/// A fully wired application over in-memory storage and fakes.
pub struct TestContext {
    pub state: AppState,
    pub store: CartStore,
    pub pool: sqlx::SqlitePool,
    pub gateway: Arc<FakeGateway>,
    pub provider: Arc<FakeProvider>,
}

impl TestContext {
    /// Stand up a fresh context with its own database.
    pub async fn new() -> Self {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("open in-memory database");
        db::MIGRATOR.run(&pool).await.expect("run migrations");

        let gateway = Arc::new(FakeGateway::new());
        let provider = Arc::new(FakeProvider::new(725));
        let state = AppState::with_clients(
            test_config(),
            pool.clone(),
            Catalog::default(),
            Arc::clone(&gateway),
            Arc::clone(&provider),
        );

        Self {
            store: state.store().clone(),
            state,
            pool,
            gateway,
            provider,
        }
    }

    /// Rows in the order_label table.
    pub async fn order_label_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM order_label")
            .fetch_one(&self.pool)
            .await
            .expect("count order labels")
    }
}

/// Configuration for tests; secrets are fixed, ports unused.
#[must_use]
pub fn test_config() -> CheckoutConfig {
    CheckoutConfig {
        database_url: "sqlite::memory:".to_owned(),
        host: "127.0.0.1".parse().expect("loopback"),
        port: 4242,
        webhook_port: 4343,
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            webhook_secret: SecretString::from(WEBHOOK_SECRET),
        },
        fulfillment: FulfillmentConfig {
            api_token: SecretString::from("pfy_1a2b3c4d5e6f7a8b9c0d"),
            shop_id: 77,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A deliverable payer for fulfillment calls.
#[must_use]
pub fn payer() -> PayerInfo {
    PayerInfo::new("Ada Lovelace", address(), Some("ada@example.com".to_owned()))
        .expect("valid payer name")
}

/// A plain US shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        line1: "500 Harbor Blvd".to_owned(),
        line2: None,
        city: "Astoria".to_owned(),
        country: "US".to_owned(),
        postal_code: "97103".to_owned(),
        state: "OR".to_owned(),
    }
}

/// Sign a webhook payload the way the gateway does: `t=...,v1=...` with
/// HMAC-SHA256 over `"{t}.{payload}"`.
#[must_use]
pub fn sign_webhook(payload: &[u8], secret: &str) -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
