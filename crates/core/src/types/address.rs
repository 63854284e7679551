//! Structured shipping address.

use serde::{Deserialize, Serialize};

/// A shipping address as supplied by the payment form and echoed by the
/// payment gateway's webhook events.
///
/// Field names follow the gateway's wire format so the same type deserializes
/// both the browser's address-update request and the webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub state: String,
}
