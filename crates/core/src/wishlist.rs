//! Wishlist membership.
//!
//! The backend owns the list; this type only answers membership questions
//! and decides which way a toggle goes.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::ProductId;

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

impl WishlistChange {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Added to wishlist",
            Self::Removed => "Removed from wishlist",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    product_ids: Vec<ProductId>,
}

impl Wishlist {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        Self {
            product_ids: products.iter().map(|p| p.id.clone()).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.product_ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// What toggling `id` should do: remove if present, add otherwise.
    #[must_use]
    pub fn toggle_action(&self, id: &ProductId) -> WishlistChange {
        if self.contains(id) {
            WishlistChange::Removed
        } else {
            WishlistChange::Added
        }
    }
}
