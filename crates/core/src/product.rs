//! Products, accessories and categories as served by the REST backend.
//!
//! Wire format is camelCase JSON; Mongo-style `_id` keys are accepted as
//! aliases for `id`. Monetary fields travel as JSON numbers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{AccessoryId, CategoryId, Price, ProductId};

/// An optional add-on sold with a garment (belt, scarf, gift wrap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    #[serde(alias = "_id")]
    pub id: AccessoryId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
    /// Category name.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Size labels in display order.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Units available per size label.
    #[serde(default)]
    pub stock: BTreeMap<String, u32>,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether `size` is one of the product's offered sizes.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }

    /// Units in stock for a size; unknown sizes have none.
    #[must_use]
    pub fn stock_for(&self, size: &str) -> u32 {
        self.stock.get(size).copied().unwrap_or(0)
    }

    /// Units in stock across the offered sizes.
    #[must_use]
    pub fn total_stock(&self) -> u32 {
        self.sizes
            .iter()
            .map(|s| self.stock_for(s))
            .fold(0u32, u32::saturating_add)
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.total_stock() > 0
    }

    /// First image, used for cards and cart thumbnails.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Look up an accessory offered with this product.
    #[must_use]
    pub fn accessory(&self, id: &AccessoryId) -> Option<&Accessory> {
        self.accessories.iter().find(|a| &a.id == id)
    }

    #[must_use]
    pub fn price_display(&self) -> String {
        Price::of(self.price).display()
    }

    /// Whole-percent discount against the original price, if marked down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original <= Decimal::ZERO {
            return None;
        }
        let pct = ((original - self.price) / original * Decimal::ONE_HUNDRED).round();
        pct.to_u32().filter(|p| *p > 0)
    }

    /// Freeze the fields a cart line needs.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            original_price: self.original_price,
            image: self.primary_image().map(str::to_owned),
            stock: self.stock.clone(),
        }
    }
}

/// The product data embedded in a cart line.
///
/// Captured at add time and refreshed whenever the same line is added to
/// again, so the cart keeps rendering if the product later disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: BTreeMap<String, u32>,
}

impl ProductSnapshot {
    #[must_use]
    pub fn stock_for(&self, size: &str) -> u32 {
        self.stock.get(size).copied().unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    use super::*;

    /// A tee in S/M/L (L sold out) with two optional accessories.
    pub fn tee() -> Product {
        Product {
            id: ProductId::new("tee-1"),
            name: "Linen Tee".to_string(),
            description: "Breathable linen tee".to_string(),
            price: Decimal::from(20),
            original_price: Some(Decimal::from(25)),
            category: "Tops".to_string(),
            images: vec!["https://cdn.drape.shop/tee.jpg".to_string()],
            sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            stock: BTreeMap::from([
                ("S".to_string(), 3),
                ("M".to_string(), 5),
                ("L".to_string(), 0),
            ]),
            accessories: vec![
                Accessory {
                    id: AccessoryId::new("belt"),
                    name: "Woven Belt".to_string(),
                    price: Decimal::from(5),
                },
                Accessory {
                    id: AccessoryId::new("wrap"),
                    name: "Gift Wrap".to_string(),
                    price: Decimal::new(250, 2),
                },
            ],
            featured: false,
            created_at: None,
        }
    }
}
