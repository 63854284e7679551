//! Payment gateway client (Stripe-shaped REST API).
//!
//! The checkout orchestrator only needs two calls: create an authorization
//! sized to the cart, and push a new amount to an existing one. The
//! [`PaymentGateway`] trait keeps that contract narrow so the orchestrator is
//! testable against a fake with no network access.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StripeConfig;

/// Payment gateway API base URL.
const API_BASE_URL: &str = "https://api.stripe.com/v1";

/// All authorizations are created in this currency.
pub const CURRENCY: &str = "usd";

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A payment authorization as reported by the gateway.
///
/// The status is passed through opaquely (`requires_payment_method`,
/// `succeeded`, ...); the backend never branches on it beyond display.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
    pub amount: i64,
}

/// Narrow contract with the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a new authorization for `amount` minor units of [`CURRENCY`].
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError>;

    /// Replace the amount on an existing authorization (idempotent).
    async fn update_intent_amount(
        &self,
        intent_id: &str,
        amount: i64,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// Production gateway client.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
}

impl StripeGateway {
    /// Create a new gateway client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            secret_key: config.secret_key.clone(),
        }
    }

    /// POST a form-encoded request and decode the intent from the response.
    async fn send_form(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self))]
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", CURRENCY.to_owned()),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
        ];

        self.send_form(format!("{API_BASE_URL}/payment_intents"), &params)
            .await
    }

    #[instrument(skip(self))]
    async fn update_intent_amount(
        &self,
        intent_id: &str,
        amount: i64,
    ) -> Result<PaymentIntent, PaymentError> {
        let params = [("amount", amount.to_string())];

        self.send_form(
            format!("{API_BASE_URL}/payment_intents/{intent_id}"),
            &params,
        )
        .await
    }
}
