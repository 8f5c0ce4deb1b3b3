//! The cart engine.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s. Each line is identified by
//! its [`LineKey`]: product, size and the sorted set of selected accessories.
//! Adding with a key that already exists merges quantities into that line.
//!
//! # Stock ceiling
//!
//! The quantity of a product held across every line of one size never
//! exceeds the stock known for that size. Lines that differ only in
//! accessories draw on the same garment stock, so they share the ceiling.
//! Adds and quantity updates that would break the ceiling are rejected and
//! leave the cart untouched; they are never clamped.
//!
//! The cart is plain data. Persisting it after each mutation is the caller's
//! job (the storefront writes it to the visitor session).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::{Accessory, Product, ProductSnapshot};
use crate::types::{AccessoryId, ProductId};

/// Reasons a cart mutation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The size is not offered for the product.
    #[error("Please select a valid size")]
    InvalidSize { size: String },

    /// Quantities must be at least one.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// No units left for this size.
    #[error("Size {size} is out of stock")]
    OutOfStock { size: String },

    /// The request exceeds what is left after existing cart lines.
    #[error("Only {available} more available in size {size}")]
    InsufficientStock {
        size: String,
        available: u32,
        requested: u32,
    },

    /// An accessory id that the product does not offer.
    #[error("That accessory is not available for this product")]
    UnknownAccessory(AccessoryId),
}

/// Identity of a cart line: product, size and sorted accessory ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub accessory_ids: Vec<AccessoryId>,
}

impl LineKey {
    /// Build a key, normalizing the accessory selection to a sorted set.
    #[must_use]
    pub fn new(product_id: ProductId, size: impl Into<String>, accessory_ids: &[AccessoryId]) -> Self {
        let mut accessory_ids = accessory_ids.to_vec();
        accessory_ids.sort();
        accessory_ids.dedup();
        Self {
            product_id,
            size: size.into(),
            accessory_ids,
        }
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub product: ProductSnapshot,
    pub size: String,
    pub quantity: u32,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
}

impl CartLine {
    #[must_use]
    pub fn key(&self) -> LineKey {
        let ids: Vec<AccessoryId> = self.accessories.iter().map(|a| a.id.clone()).collect();
        LineKey::new(self.product_id.clone(), self.size.clone(), &ids)
    }

    /// Sum of the selected accessory prices.
    #[must_use]
    pub fn accessories_price(&self) -> Decimal {
        self.accessories.iter().map(|a| a.price).sum()
    }

    /// Product price plus accessories, for one unit.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product.price + self.accessories_price()
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: &ProductId, size: &str) -> bool {
        &self.product_id == product_id && self.size == size
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// `Σ (unit price + accessories) × quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Units of `product_id` in `size` held across every line.
    #[must_use]
    pub fn quantity_in_size(&self, product_id: &ProductId, size: &str) -> u32 {
        self.items
            .iter()
            .filter(|line| line.matches(product_id, size))
            .map(|line| line.quantity)
            .sum()
    }

    /// Add `quantity` units of `product` in `size` with the given accessories.
    ///
    /// Merges into the line with the same [`LineKey`] if one exists, otherwise
    /// appends a new line. On merge the line's product snapshot is refreshed.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] and leaves the cart unchanged if the size is not
    /// offered, the quantity is not positive, an accessory is not offered, or
    /// the stock left for the size cannot cover the request.
    pub fn add_item(
        &mut self,
        product: &Product,
        size: &str,
        quantity: i64,
        accessory_ids: &[AccessoryId],
    ) -> Result<(), CartError> {
        if !product.has_size(size) {
            return Err(CartError::InvalidSize {
                size: size.to_owned(),
            });
        }
        let requested = positive_quantity(quantity)?;

        let key = LineKey::new(product.id.clone(), size, accessory_ids);
        let accessories = key
            .accessory_ids
            .iter()
            .map(|id| {
                product
                    .accessory(id)
                    .cloned()
                    .ok_or_else(|| CartError::UnknownAccessory(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stock = product.stock_for(size);
        let held = self.quantity_in_size(&product.id, size);
        let remaining = stock.saturating_sub(held);
        if remaining == 0 {
            return Err(CartError::OutOfStock {
                size: size.to_owned(),
            });
        }
        if requested > remaining {
            return Err(CartError::InsufficientStock {
                size: size.to_owned(),
                available: remaining,
                requested,
            });
        }

        if let Some(line) = self.items.iter_mut().find(|line| line.key() == key) {
            line.quantity += requested;
            line.product = product.snapshot();
        } else {
            self.items.push(CartLine {
                product_id: product.id.clone(),
                product: product.snapshot(),
                size: size.to_owned(),
                quantity: requested,
                accessories,
            });
        }
        Ok(())
    }

    /// Set the quantity of every line of `product_id` in `size`.
    ///
    /// A quantity of zero or less removes those lines, exactly like
    /// [`Cart::remove_item`]. Updating a product/size with no lines is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] (cart unchanged) if the new
    /// quantities would exceed the lowest stock recorded in the lines' snapshots.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(product_id, size);
            return Ok(());
        }
        let quantity = positive_quantity(quantity)?;

        // Snapshots of lines in one size can differ; trust the lowest.
        let Some(stock) = self
            .items
            .iter()
            .filter(|line| line.matches(product_id, size))
            .map(|line| line.product.stock_for(size))
            .min()
        else {
            return Ok(());
        };

        let lines = self
            .items
            .iter()
            .filter(|line| line.matches(product_id, size))
            .count();
        let total = quantity.saturating_mul(u32::try_from(lines).unwrap_or(u32::MAX));
        if total > stock {
            return Err(CartError::InsufficientStock {
                size: size.to_owned(),
                available: stock,
                requested: total,
            });
        }

        for line in self
            .items
            .iter_mut()
            .filter(|line| line.matches(product_id, size))
        {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Remove every line of `product_id` in `size`. Returns how many went.
    pub fn remove_item(&mut self, product_id: &ProductId, size: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(product_id, size));
        before - self.items.len()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity);
    }
    u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::product::fixtures::tee;

    fn belt() -> Vec<AccessoryId> {
        vec![AccessoryId::new("belt")]
    }

    #[test]
    fn test_add_rejects_more_than_stock() {
        let p = tee();
        let mut cart = Cart::new();

        let err = cart.add_item(&p, "S", 4, &[]).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                size: "S".to_string(),
                available: 3,
                requested: 4
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_exactly_stock_is_allowed() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "S", 3, &[]).unwrap();
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_add_rejects_invalid_size_and_quantity() {
        let p = tee();
        let mut cart = Cart::new();

        assert!(matches!(
            cart.add_item(&p, "XL", 1, &[]),
            Err(CartError::InvalidSize { .. })
        ));
        assert_eq!(cart.add_item(&p, "M", 0, &[]).unwrap_err(), CartError::InvalidQuantity);
        assert_eq!(cart.add_item(&p, "M", -2, &[]).unwrap_err(), CartError::InvalidQuantity);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_sold_out_size() {
        let p = tee();
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_item(&p, "L", 1, &[]).unwrap_err(),
            CartError::OutOfStock {
                size: "L".to_string()
            }
        );
    }

    #[test]
    fn test_same_key_merges() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 2, &belt()).unwrap();
        cart.add_item(&p, "M", 3, &belt()).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_merge_rejected_past_stock() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 4, &[]).unwrap();
        let before = cart.clone();

        let err = cart.add_item(&p, "M", 2, &[]).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                size: "M".to_string(),
                available: 1,
                requested: 2
            }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_accessory_selection_splits_lines() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 1, &[]).unwrap();
        cart.add_item(&p, "M", 1, &belt()).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.quantity_in_size(&p.id, "M"), 2);
    }

    #[test]
    fn test_accessory_order_does_not_matter() {
        let p = tee();
        let mut cart = Cart::new();
        let ab = [AccessoryId::new("belt"), AccessoryId::new("wrap")];
        let ba = [AccessoryId::new("wrap"), AccessoryId::new("belt")];
        cart.add_item(&p, "S", 1, &ab).unwrap();
        cart.add_item(&p, "S", 1, &ba).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_accessory_lines_share_size_stock() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "S", 2, &[]).unwrap();

        let err = cart.add_item(&p, "S", 2, &belt()).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 1, .. }));
    }

    #[test]
    fn test_unknown_accessory_rejected() {
        let p = tee();
        let mut cart = Cart::new();
        let err = cart
            .add_item(&p, "S", 1, &[AccessoryId::new("cape")])
            .unwrap_err();
        assert_eq!(err, CartError::UnknownAccessory(AccessoryId::new("cape")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_line_total_includes_accessories() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 3, &belt()).unwrap();
        let line = &cart.items()[0];

        assert_eq!(line.unit_price(), Decimal::from(25));
        assert_eq!(line.line_total(), Decimal::from(75));
        assert_eq!(cart.total_price(), Decimal::from(75));
    }

    #[test]
    fn test_totals_across_lines() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "S", 1, &[]).unwrap();
        cart.add_item(&p, "M", 2, &[AccessoryId::new("wrap")]).unwrap();

        assert_eq!(cart.total_items(), 3);
        // 20 + 2 * 22.50
        assert_eq!(cart.total_price(), Decimal::from(65));
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let p = tee();
        let mut a = Cart::new();
        a.add_item(&p, "M", 2, &[]).unwrap();
        a.add_item(&p, "S", 1, &[]).unwrap();
        let mut b = a.clone();

        a.update_quantity(&p.id, "M", 0).unwrap();
        b.remove_item(&p.id, "M");
        assert_eq!(a, b);
        assert_eq!(a.total_items(), 1);
    }

    #[test]
    fn test_update_replaces_quantity() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 1, &[]).unwrap();
        cart.update_quantity(&p.id, "M", 4).unwrap();
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_update_checks_snapshot_stock() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 1, &[]).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.update_quantity(&p.id, "M", 6),
            Err(CartError::InsufficientStock { available: 5, .. })
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_uses_lowest_snapshot_stock() {
        let mut fresh = tee();
        fresh.stock.insert("M".to_string(), 8);
        let stale = tee();
        let mut cart = Cart::new();
        cart.add_item(&fresh, "M", 1, &belt()).unwrap();
        cart.add_item(&fresh, "M", 1, &[]).unwrap();
        // Merging refreshes only the plain line's snapshot (M: 5).
        cart.add_item(&stale, "M", 1, &[]).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.update_quantity(&fresh.id, "M", 3),
            Err(CartError::InsufficientStock { available: 5, requested: 6, .. })
        ));
        assert_eq!(cart, before);
        cart.update_quantity(&fresh.id, "M", 2).unwrap();
        assert_eq!(cart.quantity_in_size(&fresh.id, "M"), 4);
    }

    #[test]
    fn test_update_missing_line_is_noop() {
        let p = tee();
        let mut cart = Cart::new();
        cart.update_quantity(&p.id, "S", 2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent_and_covers_accessory_lines() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 1, &[]).unwrap();
        cart.add_item(&p, "M", 1, &belt()).unwrap();

        assert_eq!(cart.remove_item(&p.id, "M"), 2);
        assert_eq!(cart.remove_item(&p.id, "M"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 2, &belt()).unwrap();
        cart.clear();

        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_merge_refreshes_snapshot() {
        let mut p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 1, &[]).unwrap();

        p.price = Decimal::from(18);
        cart.add_item(&p, "M", 1, &[]).unwrap();
        assert_eq!(cart.items()[0].product.price, Decimal::from(18));
    }

    #[test]
    fn test_cart_survives_serialization() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 2, &belt()).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
