//! Minor-currency-unit formatting helpers.
//!
//! Amounts move through the system as `i64` minor units (cents); the only
//! decimal representation is at the HTTP boundary, where totals are rendered
//! as strings like `"38.50"`.

use rust_decimal::Decimal;

/// Render a minor-unit amount as a two-decimal string, e.g. `3000` → `"30.00"`.
#[must_use]
pub fn format_minor_units(amount: i64) -> String {
    Decimal::new(amount, 2).to_string()
}
