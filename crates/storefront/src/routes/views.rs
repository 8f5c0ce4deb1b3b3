//! Display data for templates.
//!
//! Templates get plain strings and flags; all money formatting happens here.

use drape_core::Price;
use drape_core::cart::{Cart, CartLine};
use drape_core::product::Product;
use drape_core::wishlist::Wishlist;
use rust_decimal::Decimal;

/// Format an amount in the shop currency.
#[must_use]
pub fn money(amount: Decimal) -> String {
    Price::of(amount).display()
}

/// A product tile in grids (catalog, home, wishlist, related).
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub image: Option<String>,
    pub in_stock: bool,
    pub wishlisted: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, wishlist: &Wishlist) -> Self {
        let discount_percent = product.discount_percent();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price_display(),
            original_price: discount_percent
                .and(product.original_price)
                .map(money),
            discount_percent,
            image: product.primary_image().map(str::to_owned),
            in_stock: product.in_stock(),
            wishlisted: wishlist.contains(&product.id),
        }
    }

    #[must_use]
    pub fn list(products: &[Product], wishlist: &Wishlist) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, wishlist)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub quantity: u32,
    /// Units of this size still in stock, for the quantity input's `max`.
    pub max_quantity: u32,
    pub accessories: Vec<String>,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.product.name.clone(),
            image: line.product.image.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
            max_quantity: line.product.stock_for(&line.size),
            accessories: line
                .accessories
                .iter()
                .map(|a| format!("{} (+{})", a.name, money(a.price)))
                .collect(),
            unit_price: money(line.unit_price()),
            line_total: money(line.line_total()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    /// How much more to spend for free shipping; `None` once reached.
    pub free_shipping_gap: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, free_shipping_threshold: Decimal) -> Self {
        let subtotal = cart.total_price();
        let gap = free_shipping_threshold - subtotal;
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            item_count: cart.total_items(),
            subtotal: money(subtotal),
            free_shipping_gap: (!cart.is_empty() && gap > Decimal::ZERO).then(|| money(gap)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Only same-site paths are accepted as redirect targets.
#[must_use]
pub fn safe_return_to(candidate: Option<&str>, default: &str) -> String {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => default.to_string(),
    }
}
