//! Fulfillment supplier client and the order bridge.
//!
//! The [`FulfillmentProvider`] trait is the narrow remote contract (quote
//! shipping, submit an order); [`FulfillmentBridge`] owns everything local to
//! us: SKU derivation, payer-name splitting, the shipping-estimate fallback,
//! and the no-retry submission policy.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use driftpress_core::{Catalog, ShippingAddress};

use crate::config::FulfillmentConfig;
use crate::models::CartItem;

/// Fulfillment supplier API base URL.
const API_BASE_URL: &str = "https://api.printify.com/v1";

/// Flat shipping cost (minor units) charged when the supplier's quote API is
/// unreachable. Availability over accuracy: a slightly wrong shipping charge
/// beats a failed checkout.
pub const FALLBACK_SHIPPING_COST: i64 = 850;

/// Supplier code for standard shipping.
const STANDARD_SHIPPING_METHOD: i64 = 1;

/// Errors from the fulfillment layer.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The payer name was empty; the supplier requires a first name.
    #[error("invalid customer name")]
    InvalidName,

    /// Failed to build the HTTP client.
    #[error("client setup error: {0}")]
    Setup(String),
}

/// Validated payer details for shipping.
///
/// The supplier wants the name split: the first whitespace-separated token is
/// the first name, the remainder the last name.
#[derive(Debug, Clone)]
pub struct PayerInfo {
    pub first_name: String,
    pub last_name: String,
    pub address: ShippingAddress,
    pub email: Option<String>,
}

impl PayerInfo {
    /// Split and validate a payer name.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::InvalidName`] when the name contains no
    /// non-whitespace characters.
    pub fn new(
        name: &str,
        address: ShippingAddress,
        email: Option<String>,
    ) -> Result<Self, FulfillmentError> {
        let mut tokens = name.split_whitespace();
        let first_name = tokens.next().ok_or(FulfillmentError::InvalidName)?.to_owned();
        let last_name = tokens.collect::<Vec<_>>().join(" ");

        Ok(Self {
            first_name,
            last_name,
            address,
            email,
        })
    }
}

/// One order line: a single unit of a SKU. Duplicate cart rows become
/// duplicate lines, not a quantity bump.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: i64,
}

/// Destination block in the supplier's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct AddressTo {
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub country: String,
    pub region: String,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub zip: String,
}

impl AddressTo {
    fn from_payer(payer: &PayerInfo) -> Self {
        Self {
            first_name: payer.first_name.clone(),
            last_name: payer.last_name.clone(),
            email: payer.email.clone(),
            country: payer.address.country.clone(),
            region: payer.address.state.clone(),
            address1: payer.address.line1.clone(),
            address2: payer.address.line2.clone(),
            city: payer.address.city.clone(),
            zip: payer.address.postal_code.clone(),
        }
    }
}

/// Payload for a shipping quote.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub line_items: Vec<LineItem>,
    pub address_to: AddressTo,
}

/// Payload for a final order submission.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSubmission {
    /// Zero-padded order reference, e.g. "00042".
    pub label: String,
    pub line_items: Vec<LineItem>,
    pub address_to: AddressTo,
    pub shipping_method: i64,
    pub send_shipping_notification: bool,
}

/// Narrow contract with the fulfillment supplier.
#[async_trait]
pub trait FulfillmentProvider: Send + Sync {
    /// Quote standard shipping for a draft order, in minor units.
    async fn estimate_shipping(&self, draft: &OrderDraft) -> Result<i64, FulfillmentError>;

    /// Submit a final order.
    async fn submit_order(&self, order: &OrderSubmission) -> Result<(), FulfillmentError>;
}

/// Render an order-label counter value as the human-visible reference.
#[must_use]
pub fn format_order_label(label: i64) -> String {
    format!("{label:05}")
}

/// Builds supplier payloads from cart rows and applies the retry/fallback
/// policy around the provider.
pub struct FulfillmentBridge {
    provider: Arc<dyn FulfillmentProvider>,
    catalog: Catalog,
}

impl FulfillmentBridge {
    /// Create a bridge over a provider.
    #[must_use]
    pub const fn new(provider: Arc<dyn FulfillmentProvider>, catalog: Catalog) -> Self {
        Self { provider, catalog }
    }

    fn line_items(&self, items: &[CartItem]) -> Vec<LineItem> {
        items
            .iter()
            .map(|item| LineItem {
                sku: self.catalog.sku(item.kind, item.size, item.color),
                quantity: 1,
            })
            .collect()
    }

    /// Quote shipping for the cart, with one automatic retry and a flat
    /// fallback when the supplier stays unreachable. Never fails the
    /// enclosing request.
    #[instrument(skip(self, items, payer), fields(items = items.len()))]
    pub async fn estimate_shipping(&self, items: &[CartItem], payer: &PayerInfo) -> i64 {
        let draft = OrderDraft {
            line_items: self.line_items(items),
            address_to: AddressTo::from_payer(payer),
        };

        match self.provider.estimate_shipping(&draft).await {
            Ok(cost) => cost,
            Err(first_try) => {
                tracing::debug!(error = %first_try, "shipping quote failed, retrying");
                match self.provider.estimate_shipping(&draft).await {
                    Ok(cost) => cost,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            fallback = FALLBACK_SHIPPING_COST,
                            "shipping quote failed twice, using flat fallback"
                        );
                        FALLBACK_SHIPPING_COST
                    }
                }
            }
        }
    }

    /// Submit the final order, labeled with the zero-padded order reference.
    ///
    /// No retry: a duplicate physical order is worse than a missed one at
    /// this volume, so failures surface to the orchestrator (which keeps the
    /// cart reachable for manual reconciliation).
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    #[instrument(skip(self, items, payer), fields(items = items.len(), label = label))]
    pub async fn submit_order(
        &self,
        items: &[CartItem],
        payer: &PayerInfo,
        label: &str,
    ) -> Result<(), FulfillmentError> {
        let order = OrderSubmission {
            label: label.to_owned(),
            line_items: self.line_items(items),
            address_to: AddressTo::from_payer(payer),
            shipping_method: STANDARD_SHIPPING_METHOD,
            send_shipping_notification: true,
        };

        self.provider.submit_order(&order).await
    }
}

/// Production supplier client (print-on-demand REST API).
#[derive(Clone)]
pub struct PrintClient {
    client: reqwest::Client,
    shop_id: i64,
}

impl PrintClient {
    /// Create a new supplier client with bearer authentication.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::Setup`] if the API token cannot be used as
    /// a header value or the HTTP client fails to build.
    pub fn new(config: &FulfillmentConfig) -> Result<Self, FulfillmentError> {
        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = reqwest::header::HeaderValue::from_str(&auth_value)
            .map_err(|e| FulfillmentError::Setup(format!("invalid API token format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            shop_id: config.shop_id,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FulfillmentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FulfillmentError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl FulfillmentProvider for PrintClient {
    #[instrument(skip(self, draft))]
    async fn estimate_shipping(&self, draft: &OrderDraft) -> Result<i64, FulfillmentError> {
        #[derive(Deserialize)]
        struct ShippingQuote {
            standard: i64,
        }

        let url = format!("{API_BASE_URL}/shops/{}/orders/shipping.json", self.shop_id);
        let response = self.client.post(&url).json(draft).send().await?;
        let response = Self::check_status(response).await?;

        let quote: ShippingQuote = response.json().await?;
        Ok(quote.standard)
    }

    #[instrument(skip(self, order), fields(label = order.label))]
    async fn submit_order(&self, order: &OrderSubmission) -> Result<(), FulfillmentError> {
        let url = format!("{API_BASE_URL}/shops/{}/orders.json", self.shop_id);
        let response = self.client.post(&url).json(order).send().await?;
        Self::check_status(response).await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use driftpress_core::{CartId, CartItemId, ItemColor, ItemKind, ItemSize};

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            line1: "500 Harbor Blvd".to_owned(),
            line2: None,
            city: "Astoria".to_owned(),
            country: "US".to_owned(),
            postal_code: "97103".to_owned(),
            state: "OR".to_owned(),
        }
    }

    fn item(kind: ItemKind) -> CartItem {
        CartItem {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            kind,
            size: ItemSize::Xl,
            color: ItemColor::Black,
        }
    }

    /// Provider whose quote fails a configured number of times.
    struct FlakyProvider {
        quote_failures: Mutex<u32>,
        quote: i64,
        submissions: Mutex<Vec<OrderSubmission>>,
    }

    impl FlakyProvider {
        fn new(quote_failures: u32, quote: i64) -> Self {
            Self {
                quote_failures: Mutex::new(quote_failures),
                quote,
                submissions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FulfillmentProvider for FlakyProvider {
        async fn estimate_shipping(&self, _draft: &OrderDraft) -> Result<i64, FulfillmentError> {
            let mut failures = self.quote_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FulfillmentError::Api {
                    status: 500,
                    message: "quote unavailable".to_owned(),
                });
            }
            Ok(self.quote)
        }

        async fn submit_order(&self, order: &OrderSubmission) -> Result<(), FulfillmentError> {
            self.submissions.lock().unwrap().push(order.clone());
            Ok(())
        }
    }

    #[test]
    fn test_payer_name_splitting() {
        let payer = PayerInfo::new("Ada Lovelace", address(), None).unwrap();
        assert_eq!(payer.first_name, "Ada");
        assert_eq!(payer.last_name, "Lovelace");

        let payer = PayerInfo::new("Mary Jane Watson", address(), None).unwrap();
        assert_eq!(payer.first_name, "Mary");
        assert_eq!(payer.last_name, "Jane Watson");

        let payer = PayerInfo::new("Prince", address(), None).unwrap();
        assert_eq!(payer.first_name, "Prince");
        assert_eq!(payer.last_name, "");
    }

    #[test]
    fn test_empty_payer_name_rejected() {
        assert!(matches!(
            PayerInfo::new("", address(), None),
            Err(FulfillmentError::InvalidName)
        ));
        assert!(matches!(
            PayerInfo::new("   ", address(), None),
            Err(FulfillmentError::InvalidName)
        ));
    }

    #[test]
    fn test_label_padding() {
        assert_eq!(format_order_label(7), "00007");
        assert_eq!(format_order_label(42), "00042");
        assert_eq!(format_order_label(123_456), "123456");
    }

    #[tokio::test]
    async fn test_estimate_recovers_on_retry() {
        let provider = Arc::new(FlakyProvider::new(1, 725));
        let bridge = FulfillmentBridge::new(provider, Catalog::default());
        let payer = PayerInfo::new("Ada Lovelace", address(), None).unwrap();

        let cost = bridge
            .estimate_shipping(&[item(ItemKind::Hoodie)], &payer)
            .await;
        assert_eq!(cost, 725);
    }

    #[tokio::test]
    async fn test_estimate_falls_back_after_two_failures() {
        let provider = Arc::new(FlakyProvider::new(2, 725));
        let bridge = FulfillmentBridge::new(provider, Catalog::default());
        let payer = PayerInfo::new("Ada Lovelace", address(), None).unwrap();

        let cost = bridge
            .estimate_shipping(&[item(ItemKind::Hoodie)], &payer)
            .await;
        assert_eq!(cost, FALLBACK_SHIPPING_COST);
    }

    #[tokio::test]
    async fn test_submission_payload_shape() {
        let provider = Arc::new(FlakyProvider::new(0, 725));
        let bridge = FulfillmentBridge::new(Arc::clone(&provider), Catalog::default());
        let payer = PayerInfo::new("Ada Lovelace", address(), Some("ada@example.com".to_owned()))
            .unwrap();

        let items = [item(ItemKind::Sweatshirt), item(ItemKind::Sweatshirt)];
        bridge.submit_order(&items, &payer, "00042").await.unwrap();

        let submissions = provider.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let order = submissions.first().unwrap();
        assert_eq!(order.label, "00042");
        assert_eq!(order.shipping_method, STANDARD_SHIPPING_METHOD);
        assert!(order.send_shipping_notification);
        // One line per cart row, even for identical garments.
        assert_eq!(order.line_items.len(), 2);
        assert!(order.line_items.iter().all(|l| l.quantity == 1));
        assert!(order.line_items.iter().all(|l| l.sku == "DP_S_XL_BL"));
        assert_eq!(order.address_to.email.as_deref(), Some("ada@example.com"));
    }
}
