//! In-process filtering, sorting and paging of the product list.
//!
//! The backend returns the whole catalog; the storefront narrows it down per
//! request with a [`ProductQuery`] parsed from the query string.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::product::Product;

/// Products per catalog page.
pub const PAGE_SIZE: usize = 12;

/// Maximum number of related products shown on a product page.
pub const RELATED_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Featured products first, otherwise backend order.
    #[default]
    Featured,
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Featured,
            Self::Newest,
            Self::PriceAsc,
            Self::PriceDesc,
            Self::Name,
        ]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Catalog filters as submitted by the filter form.
///
/// Blank form fields deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    #[serde(deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub size: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(deserialize_with = "empty_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(deserialize_with = "empty_as_none")]
    pub in_stock: Option<bool>,
    #[serde(deserialize_with = "empty_as_none")]
    pub sort: Option<ProductSort>,
    #[serde(deserialize_with = "empty_as_none")]
    pub page: Option<usize>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        if s.is_empty() { None } else { s.parse().ok() }
    }))
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown sort: {s}"))
    }
}

impl ProductQuery {
    /// Whether `product` passes every filter in the query.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term)
                || product.category.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(size) = &self.size
            && !(product.has_size(size) && product.stock_for(size) > 0)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.in_stock == Some(true) && !product.in_stock() {
            return false;
        }
        true
    }

    #[must_use]
    pub fn sort(&self) -> ProductSort {
        self.sort.unwrap_or_default()
    }

    /// Requested page, 1-based.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Filter, sort and page `products`.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> CatalogPage {
        let mut items: Vec<Product> = products.iter().filter(|p| self.matches(p)).cloned().collect();
        sort_products(&mut items, self.sort());

        let total = items.len();
        let total_pages = total.div_ceil(PAGE_SIZE).max(1);
        let page = self.page();
        let items: Vec<Product> = items
            .into_iter()
            .skip((page - 1).saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .collect();

        CatalogPage {
            items,
            total,
            page,
            total_pages,
        }
    }
}

fn sort_products(items: &mut [Product], sort: ProductSort) {
    match sort {
        // Stable, so backend order holds within each group.
        ProductSort::Featured => items.sort_by_key(|p| !p.featured),
        ProductSort::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ProductSort::PriceAsc => items.sort_by(|a, b| a.price.cmp(&b.price)),
        ProductSort::PriceDesc => items.sort_by(|a, b| b.price.cmp(&a.price)),
        ProductSort::Name => items.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
}

/// One page of filtered products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    pub items: Vec<Product>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl CatalogPage {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Other products in the same category, up to [`RELATED_LIMIT`].
#[must_use]
pub fn related_products(product: &Product, all: &[Product]) -> Vec<Product> {
    all.iter()
        .filter(|p| p.id != product.id && p.category.eq_ignore_ascii_case(&product.category))
        .take(RELATED_LIMIT)
        .cloned()
        .collect()
}

/// Every size label offered across `products`, first-seen order.
#[must_use]
pub fn available_sizes(products: &[Product]) -> Vec<String> {
    let mut sizes: Vec<String> = Vec::new();
    for size in products.iter().flat_map(|p| p.sizes.iter()) {
        if !sizes.contains(size) {
            sizes.push(size.clone());
        }
    }
    sizes
}
