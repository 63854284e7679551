//! Checkout orchestration.
//!
//! Ties a shopping cart, a payment authorization, and an order label together
//! across three independent collaborators (payment gateway, webhook callback,
//! fulfillment supplier) without a central transaction. Per cart the flow is
//! a one-way state machine:
//!
//! ```text
//! NoIntent -> IntentCreated -> AmountSynced -> Succeeded | Failed
//! ```
//!
//! `NoIntent -> IntentCreated` happens on the first create-payment-intent
//! call; `-> AmountSynced` on each address update; `-> Succeeded` when the
//! gateway's webhook confirms payment and the fulfillment order is placed.
//! `Failed` is observational only - the cart stays open for retry.

use std::sync::Arc;

use tracing::instrument;

use driftpress_core::{Catalog, SessionToken};

use crate::db::{CartStore, StoreError};
use crate::middleware::session::{self, SessionError};
use crate::models::CartItem;
use crate::services::fulfillment::{
    FulfillmentBridge, FulfillmentError, PayerInfo, format_order_label,
};
use crate::services::payments::{PaymentError, PaymentGateway, PaymentIntent};

/// Errors from checkout orchestration.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    #[error("fulfillment error: {0}")]
    Fulfillment(#[from] FulfillmentError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Amount breakdown returned by an address update, in minor units.
#[derive(Debug, Clone)]
pub struct AmountBreakdown {
    /// Authorization status string as reported by the gateway.
    pub status: String,
    pub cart_total: i64,
    pub shipping: i64,
    pub total: i64,
}

/// The checkout orchestrator.
#[derive(Clone)]
pub struct CheckoutService {
    store: CartStore,
    catalog: Catalog,
    gateway: Arc<dyn PaymentGateway>,
    bridge: Arc<FulfillmentBridge>,
}

impl CheckoutService {
    /// Create a new orchestrator over its collaborators.
    #[must_use]
    pub fn new(
        store: CartStore,
        catalog: Catalog,
        gateway: Arc<dyn PaymentGateway>,
        bridge: FulfillmentBridge,
    ) -> Self {
        Self {
            store,
            catalog,
            gateway,
            bridge: Arc::new(bridge),
        }
    }

    fn cart_total(&self, items: &[CartItem]) -> i64 {
        self.catalog
            .order_total_minor(items.iter().map(|item| item.kind))
    }

    /// Create a payment authorization for the session's cart, or push the
    /// current cart total to the one already attached to it.
    ///
    /// Reusing the stored intent id makes repeated calls idempotent: the
    /// browser always ends up with one authorization whose amount equals the
    /// current cart total.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] when the session has no cart, or
    /// gateway errors unchanged.
    #[instrument(skip(self, token))]
    pub async fn create_or_reuse_intent(
        &self,
        token: &SessionToken,
    ) -> Result<PaymentIntent, CheckoutError> {
        let cart = self.store.get_cart(token).await?;
        let items = self.store.items_for_cart(cart.id).await?;
        let amount = self.cart_total(&items);

        let intent = if let Some(intent_id) = cart.payment_intent_id.as_deref() {
            self.gateway.update_intent_amount(intent_id, amount).await?
        } else {
            let intent = self.gateway.create_intent(amount).await?;
            self.store.update_payment_intent(token, &intent.id).await?;
            intent
        };

        tracing::info!(
            cart = %cart.id,
            intent = %intent.id,
            amount,
            "payment authorization ready"
        );
        Ok(intent)
    }

    /// Recompute the order amount now that a shipping address is known and
    /// push it to the authorization.
    ///
    /// Shipping comes from the bridge's estimate, which degrades to a flat
    /// fallback rather than failing the request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] when no cart references the intent,
    /// or gateway errors unchanged.
    #[instrument(skip(self, payer))]
    pub async fn sync_address_amount(
        &self,
        intent_id: &str,
        payer: &PayerInfo,
    ) -> Result<AmountBreakdown, CheckoutError> {
        let cart = self.store.get_cart_by_payment_intent(intent_id).await?;
        let items = self.store.items_for_cart(cart.id).await?;

        let cart_total = self.cart_total(&items);
        let shipping = self.bridge.estimate_shipping(&items, payer).await;
        let total = cart_total + shipping;

        tracing::info!(
            intent = intent_id,
            cart_total,
            shipping,
            total,
            "pushing combined amount to authorization"
        );
        let intent = self.gateway.update_intent_amount(intent_id, total).await?;

        Ok(AmountBreakdown {
            status: intent.status,
            cart_total,
            shipping,
            total,
        })
    }

    /// Terminal success transition, driven by the webhook receiver.
    ///
    /// Allocates the order label, submits the fulfillment order, and only
    /// then rotates the cart's session token so the visitor's cart reads
    /// empty while the record survives for order history. If submission
    /// fails, the rotation does not happen and the cart stays reachable - a
    /// cart whose physical order was never placed must not disappear.
    ///
    /// A rotation failure after a successful submission is logged, not
    /// propagated: the order exists and must not be resubmitted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] when no cart references the intent,
    /// or the fulfillment submission error unchanged.
    #[instrument(skip(self, payer))]
    pub async fn on_payment_succeeded(
        &self,
        intent_id: &str,
        payer: &PayerInfo,
    ) -> Result<String, CheckoutError> {
        let cart = self.store.get_cart_by_payment_intent(intent_id).await?;
        let items = self.store.items_for_cart(cart.id).await?;

        let label = format_order_label(self.store.create_order_label(cart.id).await?);
        self.bridge.submit_order(&items, payer, &label).await?;
        tracing::info!(cart = %cart.id, intent = intent_id, label, "fulfillment order submitted");

        match session::generate_token() {
            Ok(fresh) => {
                if let Err(e) = self.store.update_session_token(&cart.session_id, &fresh).await {
                    tracing::error!(
                        cart = %cart.id,
                        error = %e,
                        "failed to rotate session token after fulfillment"
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    cart = %cart.id,
                    error = %e,
                    "failed to mint replacement session token after fulfillment"
                );
            }
        }

        Ok(label)
    }

    /// Terminal failure transition: observational only. The cart keeps its
    /// intent and stays open so the visitor can retry payment.
    pub fn on_payment_failed(&self, intent_id: &str, amount: i64) {
        tracing::warn!(intent = intent_id, amount, "payment failed");
    }
}
