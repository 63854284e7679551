//! Business services for the checkout backend.
//!
//! - [`checkout`] - Orchestrates cart, payment intent, and order label
//! - [`payments`] - Payment gateway contract and production client
//! - [`fulfillment`] - Fulfillment supplier contract, bridge, and client

pub mod checkout;
pub mod fulfillment;
pub mod payments;

pub use checkout::{AmountBreakdown, CheckoutError, CheckoutService};
pub use fulfillment::{
    FALLBACK_SHIPPING_COST, FulfillmentBridge, FulfillmentError, FulfillmentProvider, PayerInfo,
    PrintClient, format_order_label,
};
pub use payments::{PaymentError, PaymentGateway, PaymentIntent, StripeGateway};
