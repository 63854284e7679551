//! Product lineup, pricing, SKU derivation, and display details.
//!
//! The catalog is the single source of truth for which (kind, size, color)
//! combinations a request may reference, what each kind costs, and how a cart
//! row maps to the supplier's SKU scheme.
//!
//! # SKU scheme
//!
//! `{prefix}_{kind initial}_{SIZE}_{first two color letters, uppercased}`,
//! e.g. `DP_S_XL_BL` for a black XL sweatshirt with prefix `DP`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::format_minor_units;

/// Garment kinds in the lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Sweatshirt,
    Tshirt,
    Hoodie,
}

impl ItemKind {
    /// Canonical lowercase identifier, as used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sweatshirt => "sweatshirt",
            Self::Tshirt => "tshirt",
            Self::Hoodie => "hoodie",
        }
    }

    /// Human-readable garment name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sweatshirt => "Sweatshirt",
            Self::Tshirt => "T-Shirt",
            Self::Hoodie => "Hoodie",
        }
    }

    /// Single-letter code used in SKUs.
    #[must_use]
    pub const fn sku_code(self) -> &'static str {
        match self {
            Self::Sweatshirt => "S",
            Self::Tshirt => "T",
            Self::Hoodie => "H",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "sweatshirt" => Some(Self::Sweatshirt),
            "tshirt" => Some(Self::Tshirt),
            "hoodie" => Some(Self::Hoodie),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown item kind {value:?}")))
    }
}

/// Garment sizes in the lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSize {
    S,
    M,
    L,
    Xl,
    #[serde(rename = "2xl")]
    Xxl,
    #[serde(rename = "3xl")]
    Xxxl,
}

impl ItemSize {
    /// Canonical lowercase identifier, as used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::Xl => "xl",
            Self::Xxl => "2xl",
            Self::Xxxl => "3xl",
        }
    }

    /// Uppercase label, used both for display and in SKUs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "2XL",
            Self::Xxxl => "3XL",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "s" => Some(Self::S),
            "m" => Some(Self::M),
            "l" => Some(Self::L),
            "xl" => Some(Self::Xl),
            "2xl" => Some(Self::Xxl),
            "3xl" => Some(Self::Xxxl),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemSize {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown size {value:?}")))
    }
}

/// Garment colors in the lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemColor {
    Black,
    Red,
    Green,
}

impl ItemColor {
    /// Canonical lowercase identifier, as used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
        }
    }

    /// Title-case label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Green => "Green",
        }
    }

    /// Two-letter code used in SKUs.
    #[must_use]
    pub const fn sku_code(self) -> &'static str {
        match self {
            Self::Black => "BL",
            Self::Red => "RE",
            Self::Green => "GR",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "black" => Some(Self::Black),
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemColor {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown color {value:?}")))
    }
}

/// Errors produced when validating catalog references.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A request referenced a kind, size, or color outside the lineup.
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

/// The configured product lineup.
///
/// Prices are in minor currency units (cents). A kind without a price entry
/// is not purchasable and is rejected by [`Catalog::parse_item`].
#[derive(Debug, Clone)]
pub struct Catalog {
    brand: String,
    sku_prefix: String,
    prices: BTreeMap<ItemKind, i64>,
}

impl Catalog {
    /// Build a catalog from a brand name, SKU prefix, and price list.
    #[must_use]
    pub const fn new(brand: String, sku_prefix: String, prices: BTreeMap<ItemKind, i64>) -> Self {
        Self {
            brand,
            sku_prefix,
            prices,
        }
    }

    /// Validate a wire-format (kind, size, color) triple against the lineup.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidItem`] naming the offending field when
    /// any component is outside the configured sets.
    pub fn parse_item(
        &self,
        kind: &str,
        size: &str,
        color: &str,
    ) -> Result<(ItemKind, ItemSize, ItemColor), CatalogError> {
        let kind = ItemKind::parse(kind)
            .filter(|k| self.prices.contains_key(k))
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown item kind {kind:?}")))?;
        let size = ItemSize::parse(size)
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown size {size:?}")))?;
        let color = ItemColor::parse(color)
            .ok_or_else(|| CatalogError::InvalidItem(format!("unknown color {color:?}")))?;
        Ok((kind, size, color))
    }

    /// Price of one unit of `kind` in minor units.
    ///
    /// Kinds absent from the configured lineup price at zero; they cannot
    /// enter a cart because [`Catalog::parse_item`] rejects them.
    #[must_use]
    pub fn price_minor(&self, kind: ItemKind) -> i64 {
        self.prices.get(&kind).copied().unwrap_or(0)
    }

    /// Sum the price of the given cart rows in minor units.
    pub fn order_total_minor(&self, kinds: impl IntoIterator<Item = ItemKind>) -> i64 {
        kinds.into_iter().map(|kind| self.price_minor(kind)).sum()
    }

    /// Derive the supplier SKU for a cart row.
    #[must_use]
    pub fn sku(&self, kind: ItemKind, size: ItemSize, color: ItemColor) -> String {
        format!(
            "{}_{}_{}_{}",
            self.sku_prefix,
            kind.sku_code(),
            size.label(),
            color.sku_code()
        )
    }

    /// Branded display name, e.g. "Driftpress Hoodie".
    #[must_use]
    pub fn display_name(&self, kind: ItemKind) -> String {
        format!("{} {}", self.brand, kind.display_name())
    }

    /// Formatted display price, e.g. "$30" or "$27.50".
    #[must_use]
    pub fn display_price(&self, kind: ItemKind) -> String {
        let amount = self.price_minor(kind);
        if amount % 100 == 0 {
            format!("${}", amount / 100)
        } else {
            format!("${}", format_minor_units(amount))
        }
    }

    /// Image asset path for a kind/color combination, e.g. "hoodie_black".
    #[must_use]
    pub fn image_path(kind: ItemKind, color: ItemColor) -> String {
        format!("{}_{}", kind.as_str(), color.as_str())
    }

    /// All purchasable kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = ItemKind> + '_ {
        self.prices.keys().copied()
    }
}

impl Default for Catalog {
    /// The stock Driftpress lineup: three garments, thirty dollars each.
    fn default() -> Self {
        let prices = [
            (ItemKind::Sweatshirt, 3000),
            (ItemKind::Tshirt, 3000),
            (ItemKind::Hoodie, 3000),
        ]
        .into_iter()
        .collect();
        Self::new("Driftpress".to_owned(), "DP".to_owned(), prices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL_KINDS: [ItemKind; 3] = [ItemKind::Sweatshirt, ItemKind::Tshirt, ItemKind::Hoodie];
    const ALL_SIZES: [ItemSize; 6] = [
        ItemSize::S,
        ItemSize::M,
        ItemSize::L,
        ItemSize::Xl,
        ItemSize::Xxl,
        ItemSize::Xxxl,
    ];
    const ALL_COLORS: [ItemColor; 3] = [ItemColor::Black, ItemColor::Red, ItemColor::Green];

    #[test]
    fn test_every_valid_triple_parses_and_derives_deterministically() {
        let catalog = Catalog::default();
        for kind in ALL_KINDS {
            for size in ALL_SIZES {
                for color in ALL_COLORS {
                    let parsed = catalog
                        .parse_item(kind.as_str(), size.as_str(), color.as_str())
                        .unwrap();
                    assert_eq!(parsed, (kind, size, color));

                    let sku = catalog.sku(kind, size, color);
                    assert_eq!(sku, catalog.sku(kind, size, color), "SKU not stable");
                    assert!(sku.starts_with("DP_"));
                    assert!(sku.ends_with(color.sku_code()));
                }
            }
        }
    }

    #[test]
    fn test_sku_examples() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.sku(ItemKind::Sweatshirt, ItemSize::Xl, ItemColor::Black),
            "DP_S_XL_BL"
        );
        assert_eq!(
            catalog.sku(ItemKind::Hoodie, ItemSize::Xxl, ItemColor::Green),
            "DP_H_2XL_GR"
        );
        assert_eq!(
            catalog.sku(ItemKind::Tshirt, ItemSize::S, ItemColor::Red),
            "DP_T_S_RE"
        );
    }

    #[test]
    fn test_parse_item_rejects_unknown_values() {
        let catalog = Catalog::default();
        assert!(matches!(
            catalog.parse_item("mug", "s", "black"),
            Err(CatalogError::InvalidItem(_))
        ));
        assert!(matches!(
            catalog.parse_item("hoodie", "4xl", "black"),
            Err(CatalogError::InvalidItem(_))
        ));
        assert!(matches!(
            catalog.parse_item("hoodie", "s", "mauve"),
            Err(CatalogError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_parse_item_rejects_unpriced_kind() {
        let prices = [(ItemKind::Hoodie, 3000)].into_iter().collect();
        let catalog = Catalog::new("Driftpress".to_owned(), "DP".to_owned(), prices);
        assert!(catalog.parse_item("hoodie", "s", "black").is_ok());
        assert!(matches!(
            catalog.parse_item("tshirt", "s", "black"),
            Err(CatalogError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_order_total_sums_prices() {
        let catalog = Catalog::default();
        assert_eq!(catalog.order_total_minor([]), 0);
        assert_eq!(
            catalog.order_total_minor([ItemKind::Hoodie, ItemKind::Tshirt]),
            6000
        );
    }

    #[test]
    fn test_display_details() {
        let catalog = Catalog::default();
        assert_eq!(catalog.display_name(ItemKind::Tshirt), "Driftpress T-Shirt");
        assert_eq!(catalog.display_price(ItemKind::Hoodie), "$30");
        assert_eq!(
            Catalog::image_path(ItemKind::Hoodie, ItemColor::Black),
            "hoodie_black"
        );
    }

    #[test]
    fn test_size_serde_renames() {
        assert_eq!(serde_json::to_string(&ItemSize::Xxl).unwrap(), "\"2xl\"");
        let parsed: ItemSize = serde_json::from_str("\"3xl\"").unwrap();
        assert_eq!(parsed, ItemSize::Xxxl);
    }
}
