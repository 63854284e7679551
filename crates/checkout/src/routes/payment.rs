//! Checkout route handlers: payment intent creation and address updates.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftpress_core::{ShippingAddress, format_minor_units};

use crate::error::{AppError, Result};
use crate::middleware::session::begin_session;
use crate::services::checkout::CheckoutError;
use crate::services::fulfillment::PayerInfo;
use crate::state::AppState;

/// Response body for `/api/create-payment-intent`.
#[derive(Debug, Serialize)]
pub struct ClientSecretResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Request body for `/api/address-update`, mirroring the payment form.
#[derive(Debug, Deserialize)]
pub struct AddressUpdateRequest {
    pub client_secret: String,
    pub name: String,
    pub address: ShippingAddress,
    #[serde(default)]
    pub receipt_email: Option<String>,
}

/// Response body for `/api/address-update`. Amounts are decimal strings.
#[derive(Debug, Serialize)]
pub struct AddressUpdateResponse {
    pub status: String,
    pub cart: String,
    pub shipping: String,
    pub total: String,
}

/// Create (or reuse) the payment authorization for the visitor's cart and
/// hand its client secret to the browser.
#[instrument(skip(state, jar))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ClientSecretResponse>)> {
    let (token, jar) = begin_session(jar)?;
    let intent = state.checkout().create_or_reuse_intent(&token).await?;

    Ok((
        jar,
        Json(ClientSecretResponse {
            client_secret: intent.client_secret,
        }),
    ))
}

/// Recompute cart + shipping now that an address is known, push the total to
/// the authorization, and report the breakdown.
#[instrument(skip(state, payload))]
pub async fn address_update(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddressUpdateRequest>, JsonRejection>,
) -> Result<Json<AddressUpdateResponse>> {
    let request = payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let intent_id = intent_id_from_client_secret(&request.client_secret)?;
    let payer = PayerInfo::new(&request.name, request.address, request.receipt_email)
        .map_err(CheckoutError::from)?;

    let breakdown = state.checkout().sync_address_amount(intent_id, &payer).await?;

    Ok(Json(AddressUpdateResponse {
        status: breakdown.status,
        cart: format_minor_units(breakdown.cart_total),
        shipping: format_minor_units(breakdown.shipping),
        total: format_minor_units(breakdown.total),
    }))
}

/// The browser only holds the client secret (`{intent id}_secret_{nonce}`);
/// recover the intent id from its prefix.
fn intent_id_from_client_secret(client_secret: &str) -> Result<&str> {
    let intent_id = client_secret.split("_secret").next().unwrap_or_default();
    if intent_id.is_empty() {
        return Err(AppError::BadRequest("malformed client secret".to_owned()));
    }
    Ok(intent_id)
}
