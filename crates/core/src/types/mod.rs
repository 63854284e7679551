//! Shared type definitions.
//!
//! # Modules
//!
//! - [`id`] - Newtype IDs for type-safe entity references
//! - [`token`] - Opaque per-browser session token
//! - [`catalog`] - Product lineup, pricing, SKU derivation, display details
//! - [`address`] - Structured shipping address
//! - [`money`] - Minor-currency-unit formatting helpers

pub mod address;
pub mod catalog;
pub mod id;
pub mod money;
pub mod token;

pub use address::ShippingAddress;
pub use catalog::{Catalog, CatalogError, ItemColor, ItemKind, ItemSize};
pub use id::{CartId, CartItemId};
pub use money::format_minor_units;
pub use token::{SESSION_TOKEN_LEN, SessionToken, TokenError};
