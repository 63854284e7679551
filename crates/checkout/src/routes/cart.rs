//! Cart route handlers.
//!
//! All cart endpoints are POSTs from the storefront SPA. Retrieval endpoints
//! treat a missing cart as an empty one (a new visitor has no rows yet) and
//! answer 201; mutation endpoints answer 201 with a plain-text ack or 400.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftpress_core::SessionToken;

use crate::db::StoreError;
use crate::error::{AppError, Result};
use crate::middleware::session::begin_session;
use crate::models::{CartItem, CartItemView};
use crate::state::AppState;

/// Wire format of a cart item reference. The `id` field carries the item
/// kind (historical field name from the storefront).
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub id: String,
    pub size: String,
    pub color: String,
}

/// Response body for `/api/items`.
#[derive(Debug, Serialize)]
pub struct ItemCountResponse {
    pub items: usize,
}

/// Fetch a session's items, mapping "no cart yet" to an empty list.
async fn fetch_items(state: &AppState, token: &SessionToken) -> Result<Vec<CartItem>> {
    match state.store().items_for_session(token).await {
        Err(StoreError::NotExists) => Ok(Vec::new()),
        other => other.map_err(AppError::Store),
    }
}

/// Unpack a JSON body, answering 400 (not axum's default 422) on bad input.
fn unpack<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Report the number of items in the visitor's cart.
#[instrument(skip(state, jar))]
pub async fn item_count(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, (StatusCode, Json<ItemCountResponse>))> {
    let (token, jar) = begin_session(jar)?;
    let items = fetch_items(&state, &token).await?;

    Ok((
        jar,
        (
            StatusCode::CREATED,
            Json(ItemCountResponse { items: items.len() }),
        ),
    ))
}

/// List the visitor's cart with derived display fields.
#[instrument(skip(state, jar))]
pub async fn retrieve_cart(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, (StatusCode, Json<Vec<CartItemView>>))> {
    let (token, jar) = begin_session(jar)?;
    let items = fetch_items(&state, &token).await?;

    let views = items
        .iter()
        .map(|item| CartItemView::new(state.catalog(), item))
        .collect();

    Ok((jar, (StatusCode::CREATED, Json(views))))
}

/// Add an item to the visitor's cart, creating the cart on first mutation.
#[instrument(skip(state, jar, payload))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<CartItemRequest>, JsonRejection>,
) -> Result<(CookieJar, (StatusCode, &'static str))> {
    let request = unpack(payload)?;
    let (kind, size, color) = state
        .catalog()
        .parse_item(&request.id, &request.size, &request.color)?;

    let (token, jar) = begin_session(jar)?;
    let cart = state.store().get_or_create_cart(&token).await?;
    state.store().add_item(cart.id, kind, size, color).await?;

    tracing::info!(cart = %cart.id, item = %kind, "added item to cart");
    Ok((jar, (StatusCode::CREATED, "Successful Request")))
}

/// Remove one structural match of the referenced item from the cart.
#[instrument(skip(state, jar, payload))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<CartItemRequest>, JsonRejection>,
) -> Result<(CookieJar, (StatusCode, &'static str))> {
    let request = unpack(payload)?;
    let (kind, size, color) = state
        .catalog()
        .parse_item(&request.id, &request.size, &request.color)?;

    let (token, jar) = begin_session(jar)?;
    let cart = state.store().get_or_create_cart(&token).await?;
    state.store().remove_item(cart.id, kind, size, color).await?;

    tracing::info!(cart = %cart.id, item = %kind, "removed item from cart");
    Ok((jar, (StatusCode::CREATED, "Successful Request")))
}
