//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`; the `IntoResponse`
//! implementation maps error kinds to the API's plain-text responses and
//! captures server-side failures to Sentry before responding.
//!
//! Cart endpoints answer validation and store failures with 400; checkout
//! endpoints treat any orchestration failure as 500. Retrieval handlers map
//! a missing cart to an empty result *before* this type is involved -
//! absence of a cart is a normal state for a new visitor, not an error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use driftpress_core::CatalogError;

use crate::db::StoreError;
use crate::middleware::session::SessionError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the checkout API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed during a cart mutation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Request referenced a value outside the configured catalog.
    #[error("validation error: {0}")]
    Validation(#[from] CatalogError),

    /// Session token could not be minted.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout orchestration failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Malformed request from the client.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Store(_) | Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Checkout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal Server Error"
        } else {
            "Bad Request"
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
