//! Cart, cart entries, and the product metadata they carry.
//!
//! A [`Cart`] is an ordered sequence of [`CartEntry`] values, one per
//! product, in insertion order. The type upholds two invariants:
//!
//! - no two entries share a [`ProductId`]
//! - every entry's amount is at least 1 (an entry that would reach 0 is
//!   removed instead)
//!
//! Mutation methods here are building blocks; quantity validation against
//! remote stock belongs to the store layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// Product metadata as reported by the stock service at add time.
///
/// Unknown fields in the service response are ignored on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One product's record within the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product metadata copied from the stock service when first added.
    #[serde(flatten)]
    pub product: Product,
    /// Selected quantity, always >= 1.
    pub amount: u32,
}

impl CartEntry {
    /// Create an entry for a freshly added product.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// The entry's product ID.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Line total: unit price times amount.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.amount * Decimal::from(self.amount)
    }
}

/// The user's current selection of products and quantities.
///
/// Serializes as a plain JSON array of entries, which is also the
/// persisted representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Look up the entry for a product, if present.
    #[must_use]
    pub fn entry(&self, product_id: ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.product.id == product_id)
    }

    /// Current amount for a product, if present.
    #[must_use]
    pub fn amount_of(&self, product_id: ProductId) -> Option<u32> {
        self.entry(product_id).map(|e| e.amount)
    }

    /// Append a new entry.
    ///
    /// Returns `false` (leaving the cart unchanged) if an entry with the
    /// same product ID already exists.
    pub fn insert(&mut self, entry: CartEntry) -> bool {
        if self.entry(entry.product.id).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Set the amount for an existing entry to an exact value.
    ///
    /// Returns `false` if no entry with that product ID exists or if
    /// `amount` is 0 (entries never hold a zero amount; remove instead).
    pub fn set_amount(&mut self, product_id: ProductId, amount: u32) -> bool {
        if amount == 0 {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.product.id == product_id) {
            Some(entry) => {
                entry.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for a product entirely, returning it if present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.product.id == product_id)?;
        Some(self.entries.remove(index))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.iter()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total unit count across all entries.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Sum of line totals across all entries.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartEntry;
    type IntoIter = std::slice::Iter<'a, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::price::CurrencyCode;

    fn product(id: i32, price_cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::new(Decimal::new(price_cents, 2), CurrencyCode::USD),
            image: None,
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_product() {
        let mut cart = Cart::new();
        assert!(cart.insert(CartEntry::new(product(1, 1000), 1)));
        assert!(!cart.insert(CartEntry::new(product(1, 1000), 3)));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.amount_of(ProductId::new(1)), Some(1));
    }

    #[test]
    fn test_set_amount_rejects_zero() {
        let mut cart = Cart::new();
        cart.insert(CartEntry::new(product(1, 1000), 2));
        assert!(!cart.set_amount(ProductId::new(1), 0));
        assert_eq!(cart.amount_of(ProductId::new(1)), Some(2));
    }

    #[test]
    fn test_set_amount_missing_entry() {
        let mut cart = Cart::new();
        assert!(!cart.set_amount(ProductId::new(9), 5));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut cart = Cart::new();
        cart.insert(CartEntry::new(product(1, 100), 1));
        cart.insert(CartEntry::new(product(2, 200), 1));
        cart.insert(CartEntry::new(product(3, 300), 1));

        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.product_id(), ProductId::new(2));

        let ids: Vec<i32> = cart.iter().map(|e| e.product.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.insert(CartEntry::new(product(1, 1050), 2)); // 21.00
        cart.insert(CartEntry::new(product(2, 500), 3)); // 15.00
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(3600, 2));
    }

    #[test]
    fn test_serde_shape_is_flat_array() {
        let mut cart = Cart::new();
        cart.insert(CartEntry::new(product(7, 999), 2));

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 7);
        assert_eq!(json[0]["amount"], 2);
        assert_eq!(json[0]["price"]["amount"], "9.99");

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
