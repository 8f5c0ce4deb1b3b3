//! Cache types for catalog reads.

use drape_core::ProductId;
use drape_core::checkout::PaymentSettings;
use drape_core::product::{Category, Product};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
    PaymentSettings,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
    Categories(Vec<Category>),
    PaymentSettings(PaymentSettings),
}
