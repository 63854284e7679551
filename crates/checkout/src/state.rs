//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use driftpress_core::Catalog;

use crate::config::CheckoutConfig;
use crate::db::CartStore;
use crate::services::checkout::CheckoutService;
use crate::services::fulfillment::{FulfillmentBridge, FulfillmentError, FulfillmentProvider, PrintClient};
use crate::services::payments::{PaymentGateway, StripeGateway};

/// Error constructing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("fulfillment client error: {0}")]
    Fulfillment(#[from] FulfillmentError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; owns the store and the checkout orchestrator
/// explicitly - there is no ambient global database handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    catalog: Catalog,
    store: CartStore,
    checkout: CheckoutService,
}

impl AppState {
    /// Create the production state with real gateway and supplier clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the fulfillment client cannot be constructed.
    pub fn new(config: CheckoutConfig, pool: SqlitePool) -> Result<Self, StateError> {
        let gateway = Arc::new(StripeGateway::new(&config.stripe));
        let provider = Arc::new(PrintClient::new(&config.fulfillment)?);
        Ok(Self::with_clients(config, pool, Catalog::default(), gateway, provider))
    }

    /// Create state with injected collaborators (tests use fakes here).
    #[must_use]
    pub fn with_clients(
        config: CheckoutConfig,
        pool: SqlitePool,
        catalog: Catalog,
        gateway: Arc<dyn PaymentGateway>,
        provider: Arc<dyn FulfillmentProvider>,
    ) -> Self {
        let store = CartStore::new(pool);
        let bridge = FulfillmentBridge::new(provider, catalog.clone());
        let checkout = CheckoutService::new(store.clone(), catalog.clone(), gateway, bridge);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                store,
                checkout,
            }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the configured catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn store(&self) -> &CartStore {
        &self.inner.store
    }

    /// Get a reference to the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
