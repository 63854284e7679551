//! Payment-status webhook listener.
//!
//! Runs on its own port with no CSRF layer; authentication is the gateway's
//! payload signature. Once the signature verifies and the envelope parses,
//! the response is always 200 - the gateway's retry policy must not be
//! triggered by internal processing errors, which are logged for manual
//! reconciliation instead.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

use driftpress_core::ShippingAddress;

use crate::services::fulfillment::PayerInfo;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Hard ceiling on webhook payload size.
pub const MAX_BODY_BYTES: usize = 65536;

/// Signature header set by the payment gateway.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted clock skew between the gateway and us.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Reasons a webhook signature fails verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing timestamp in signature header")]
    MissingTimestamp,
    #[error("missing v1 signature in signature header")]
    MissingSignature,
    #[error("malformed timestamp")]
    MalformedTimestamp,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    Mismatch,
}

/// Webhook event envelope.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

/// The payment intent object carried by `payment_intent.*` events.
#[derive(Debug, Deserialize)]
struct EventPaymentIntent {
    id: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    receipt_email: Option<String>,
    #[serde(default)]
    shipping: Option<EventShipping>,
}

#[derive(Debug, Deserialize)]
struct EventShipping {
    name: String,
    address: ShippingAddress,
}

/// Handle an inbound payment-status callback.
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let payload = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read webhook body");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = verify_signature(
        &payload,
        signature,
        state.config().stripe.webhook_secret.expose_secret(),
        unix_now(),
    ) {
        tracing::warn!(error = %e, "webhook signature verification failed");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse webhook envelope");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match event.kind.as_str() {
        "payment_intent.succeeded" => handle_succeeded(&state, event.data.object).await,
        "payment_intent.failed" | "payment_intent.payment_failed" => {
            handle_failed(&state, event.data.object);
        }
        other => tracing::debug!(kind = other, "acknowledging unhandled webhook event"),
    }

    StatusCode::OK.into_response()
}

async fn handle_succeeded(state: &AppState, object: serde_json::Value) {
    let intent: EventPaymentIntent = match serde_json::from_value(object) {
        Ok(intent) => intent,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse succeeded payment intent");
            return;
        }
    };
    tracing::info!(intent = %intent.id, amount = intent.amount, "payment succeeded");

    let Some(shipping) = intent.shipping else {
        tracing::error!(intent = %intent.id, "succeeded event carries no shipping details");
        return;
    };

    let payer = match PayerInfo::new(&shipping.name, shipping.address, intent.receipt_email) {
        Ok(payer) => payer,
        Err(e) => {
            tracing::error!(intent = %intent.id, error = %e, "unusable payer details");
            return;
        }
    };

    if let Err(e) = state.checkout().on_payment_succeeded(&intent.id, &payer).await {
        tracing::error!(
            intent = %intent.id,
            error = %e,
            "order submission failed; cart left reachable for reconciliation"
        );
    }
}

fn handle_failed(state: &AppState, object: serde_json::Value) {
    match serde_json::from_value::<EventPaymentIntent>(object) {
        Ok(intent) => state.checkout().on_payment_failed(&intent.id, intent.amount),
        Err(e) => tracing::error!(error = %e, "failed to parse failed payment intent"),
    }
}

/// Verify a `t=...,v1=...` signature header: HMAC-SHA256 over
/// `"{timestamp}.{payload}"` with the shared endpoint secret, within a
/// bounded timestamp tolerance. The comparison is constant-time.
fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let signature = signature.ok_or(SignatureError::MissingSignature)?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let signature = hex::decode(signature).map_err(|_| SignatureError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::MalformedSignature)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| SignatureError::Mismatch)
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}
