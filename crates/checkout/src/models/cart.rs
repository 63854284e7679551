//! Shopping cart and cart item models.

use serde::Serialize;

use driftpress_core::{Catalog, CartId, CartItemId, ItemColor, ItemKind, ItemSize, SessionToken};

/// A visitor's shopping cart.
///
/// The record outlives the browser session that created it: after a
/// successful payment the session token is rotated to a fresh random value,
/// so the row stays for order history but is no longer reachable from the
/// original cookie.
#[derive(Debug, Clone)]
pub struct ShoppingCart {
    pub id: CartId,
    pub session_id: SessionToken,
    /// Set when checkout starts; reused for amount updates until the cart is
    /// cleared.
    pub payment_intent_id: Option<String>,
}

/// A single cart row.
///
/// Duplicate (kind, size, color) rows are legal; each row is one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub kind: ItemKind,
    pub size: ItemSize,
    pub color: ItemColor,
}

/// Cart item with derived display fields, as returned by `/api/retrieve_cart`.
///
/// Everything here is a function of the (kind, size, color) triple and the
/// catalog; nothing is stored.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    /// Wire identifier of the kind, e.g. "hoodie".
    pub id: String,
    /// Uppercase size label, e.g. "XL".
    pub size: String,
    /// Title-case color label, e.g. "Black".
    pub color: String,
    pub display: DisplayDetails,
}

/// Display-only fields for the cart page.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayDetails {
    pub name: String,
    pub imgsrc: String,
    pub price: String,
}

impl CartItemView {
    /// Derive the display view of a cart row from the catalog.
    #[must_use]
    pub fn new(catalog: &Catalog, item: &CartItem) -> Self {
        Self {
            id: item.kind.as_str().to_owned(),
            size: item.size.label().to_owned(),
            color: item.color.label().to_owned(),
            display: DisplayDetails {
                name: catalog.display_name(item.kind),
                imgsrc: Catalog::image_path(item.kind, item.color),
                price: catalog.display_price(item.kind),
            },
        }
    }
}
