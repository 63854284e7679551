//! HTTP route handlers for the checkout backend.
//!
//! # Route Structure
//!
//! ```text
//! # Site listener (default port 4242, CSRF double-submit on /api)
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database ping)
//! POST /api/items                  - Item count for the cart badge
//! POST /api/retrieve_cart          - Cart items with display fields
//! POST /api/add_to_cart            - Add an item
//! POST /api/remove_from_cart       - Remove one matching item
//! POST /api/checkout               - Alias of remove_from_cart
//! POST /api/create-payment-intent  - Create/reuse the payment authorization
//! POST /api/address-update         - Push cart + shipping amount
//!
//! # Webhook listener (default port 4343, signature-verified)
//! POST /webhook                    - Payment-status callbacks
//! ```

pub mod cart;
pub mod payment;
pub mod webhook;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::csrf_middleware;
use crate::state::AppState;

/// Create the `/api` routes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", post(cart::item_count))
        .route("/api/retrieve_cart", post(cart::retrieve_cart))
        .route("/api/add_to_cart", post(cart::add_to_cart))
        .route("/api/remove_from_cart", post(cart::remove_from_cart))
        // Historical alias used by the checkout page
        .route("/api/checkout", post(cart::remove_from_cart))
        .route(
            "/api/create-payment-intent",
            post(payment::create_payment_intent),
        )
        .route("/api/address-update", post(payment::address_update))
}

/// Build the site listener router (health + CSRF-protected API).
pub fn site_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api_routes().layer(axum::middleware::from_fn(csrf_middleware)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the webhook listener router.
pub fn webhook_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.store().pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
