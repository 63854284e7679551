//! Domain models for the checkout backend.

pub mod cart;

pub use cart::{CartItem, CartItemView, ShoppingCart};
