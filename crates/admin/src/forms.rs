//! Product and category form parsing.
//!
//! Product forms use compact text fields:
//!
//! | field | format | example |
//! |---|---|---|
//! | sizes | comma list | `S, M, L` |
//! | stock | `size:qty` comma list | `S:10, M:4` |
//! | accessories | `name:price` semicolon list | `Belt:5; Scarf:3.5` |
//! | images | one URL per line | |
//!
//! Sizes missing from the stock field are stocked at zero; stock entries for
//! sizes not in the size list are rejected.

use std::collections::{BTreeMap, HashMap};

use drape_core::product::{Category, Product};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a product or category form was rejected. The message is shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Name is required")]
    MissingName,

    #[error("Choose a category")]
    MissingCategory,

    #[error("Price must be a positive number")]
    InvalidPrice,

    #[error("Original price must be a number higher than the price")]
    InvalidOriginalPrice,

    #[error("List at least one size")]
    NoSizes,

    #[error("Stock entry `{0}` must look like `M:10`")]
    InvalidStockEntry(String),

    #[error("Stock lists size {0}, which is not in the size list")]
    UnknownStockSize(String),

    #[error("Accessory `{0}` must look like `Belt:5`")]
    InvalidAccessory(String),
}

/// An accessory as sent to the backend; the backend assigns ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryPayload {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
    pub category: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: BTreeMap<String, u32>,
    pub accessories: Vec<AccessoryPayload>,
    pub featured: bool,
}

/// Raw product form values, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub original_price: String,
    pub category: String,
    pub sizes: String,
    pub stock: String,
    pub accessories: String,
    pub images: String,
    pub featured: bool,
}

impl ProductForm {
    /// Read the text fields of a submitted form. Unknown keys are ignored.
    #[must_use]
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            name: field("name"),
            description: field("description"),
            price: field("price"),
            original_price: field("original_price"),
            category: field("category"),
            sizes: field("sizes"),
            stock: field("stock"),
            accessories: field("accessories"),
            images: field("images"),
            featured: fields.contains_key("featured"),
        }
    }

    /// Prefill the edit form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.normalize().to_string(),
            original_price: product
                .original_price
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
            category: product.category.clone(),
            sizes: product.sizes.join(", "),
            stock: format_stock(&product.sizes, &product.stock),
            accessories: product
                .accessories
                .iter()
                .map(|a| format!("{}:{}", a.name, a.price.normalize()))
                .collect::<Vec<_>>()
                .join("; "),
            images: product.images.join("\n"),
            featured: product.featured,
        }
    }

    /// Append an uploaded image URL to the image list.
    pub fn push_image(&mut self, url: &str) {
        if !self.images.trim().is_empty() {
            self.images.push('\n');
        }
        self.images.push_str(url);
    }

    /// # Errors
    ///
    /// Returns the first problem found, in form order.
    pub fn validate(&self) -> Result<ProductPayload, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }

        let price = parse_money(&self.price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(FormError::InvalidPrice)?;

        let original_price = match self.original_price.trim() {
            "" => None,
            raw => Some(
                parse_money(raw)
                    .filter(|original| *original > price)
                    .ok_or(FormError::InvalidOriginalPrice)?,
            ),
        };

        let category = self.category.trim();
        if category.is_empty() {
            return Err(FormError::MissingCategory);
        }

        let sizes = parse_sizes(&self.sizes);
        if sizes.is_empty() {
            return Err(FormError::NoSizes);
        }
        let stock = parse_stock(&self.stock, &sizes)?;
        let accessories = parse_accessories(&self.accessories)?;

        Ok(ProductPayload {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            original_price,
            category: category.to_string(),
            images: parse_lines(&self.images),
            sizes,
            stock,
            accessories,
            featured: self.featured,
        })
    }
}

/// Body of `POST /categories` and `PUT /categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl CategoryForm {
    #[must_use]
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            image: category.image.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`FormError::MissingName`] for a blank name.
    pub fn validate(&self) -> Result<CategoryPayload, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Ok(CategoryPayload {
            name: name.to_string(),
            description: optional(&self.description),
            image: optional(&self.image),
        })
    }
}

fn parse_money(raw: &str) -> Option<Decimal> {
    raw.trim().parse::<Decimal>().ok()
}

/// `"S, M ,,L, M"` → `["S", "M", "L"]`.
#[must_use]
pub fn parse_sizes(raw: &str) -> Vec<String> {
    let mut sizes: Vec<String> = Vec::new();
    for size in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !sizes.iter().any(|s| s == size) {
            sizes.push(size.to_string());
        }
    }
    sizes
}

/// Parse `S:10, M:4` against the declared sizes.
///
/// # Errors
///
/// Rejects malformed entries and sizes that were not declared.
pub fn parse_stock(raw: &str, sizes: &[String]) -> Result<BTreeMap<String, u32>, FormError> {
    let mut stock: BTreeMap<String, u32> = sizes.iter().map(|s| (s.clone(), 0)).collect();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (size, qty) = entry
            .split_once(':')
            .ok_or_else(|| FormError::InvalidStockEntry(entry.to_string()))?;
        let size = size.trim();
        let qty: u32 = qty
            .trim()
            .parse()
            .map_err(|_| FormError::InvalidStockEntry(entry.to_string()))?;

        match stock.get_mut(size) {
            Some(slot) => *slot = qty,
            None => return Err(FormError::UnknownStockSize(size.to_string())),
        }
    }
    Ok(stock)
}

/// Parse `Belt:5; Scarf:3.5`. The name may itself contain colons; the price
/// follows the last one.
///
/// # Errors
///
/// Rejects entries without a name or a non-negative price.
pub fn parse_accessories(raw: &str) -> Result<Vec<AccessoryPayload>, FormError> {
    raw.split(';')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|entry| {
            let invalid = || FormError::InvalidAccessory(entry.to_string());
            let (name, price) = entry.rsplit_once(':').ok_or_else(invalid)?;
            let name = name.trim();
            let price = parse_money(price)
                .filter(|p| *p >= Decimal::ZERO)
                .ok_or_else(invalid)?;
            if name.is_empty() {
                return Err(invalid());
            }
            Ok(AccessoryPayload {
                name: name.to_string(),
                price,
            })
        })
        .collect()
}

fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `S:10, M:4` in declared size order.
#[must_use]
pub fn format_stock(sizes: &[String], stock: &BTreeMap<String, u32>) -> String {
    sizes
        .iter()
        .map(|s| format!("{s}:{}", stock.get(s).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use drape_core::product::Accessory;
    use drape_core::{AccessoryId, ProductId};

    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: " Linen Shirt ".to_string(),
            description: "Breathable summer linen.".to_string(),
            price: "49.50".to_string(),
            original_price: String::new(),
            category: "Shirts".to_string(),
            sizes: "S, M, L".to_string(),
            stock: "S:10, M:4".to_string(),
            accessories: "Belt:5; Scarf:3.5".to_string(),
            images: "https://cdn.drape.shop/linen-1.jpg\n\n".to_string(),
            featured: true,
        }
    }

    #[test]
    fn test_valid_form() {
        let payload = form().validate().unwrap();
        assert_eq!(payload.name, "Linen Shirt");
        assert_eq!(payload.price, "49.5".parse::<Decimal>().unwrap());
        assert_eq!(payload.sizes, vec!["S", "M", "L"]);
        assert_eq!(payload.stock.get("L"), Some(&0));
        assert_eq!(payload.stock.get("S"), Some(&10));
        assert_eq!(payload.accessories.len(), 2);
        assert_eq!(payload.accessories[1].name, "Scarf");
        assert_eq!(payload.images.len(), 1);
    }

    #[test]
    fn test_payload_wire_format() {
        let json = serde_json::to_value(form().validate().unwrap()).unwrap();
        assert_eq!(json["price"], serde_json::json!(49.5));
        assert!(json.get("originalPrice").is_none());
        assert_eq!(json["stock"]["M"], 4);
        assert_eq!(json["accessories"][0]["price"], serde_json::json!(5.0));
    }

    #[test]
    fn test_price_rules() {
        let mut f = form();
        f.price = "0".to_string();
        assert_eq!(f.validate().unwrap_err(), FormError::InvalidPrice);

        let mut f = form();
        f.price = "abc".to_string();
        assert_eq!(f.validate().unwrap_err(), FormError::InvalidPrice);

        let mut f = form();
        f.original_price = "40".to_string();
        assert_eq!(f.validate().unwrap_err(), FormError::InvalidOriginalPrice);

        let mut f = form();
        f.original_price = "65".to_string();
        assert_eq!(
            f.validate().unwrap().original_price,
            Some(Decimal::from(65))
        );
    }

    #[test]
    fn test_stock_rejects_unknown_size_and_bad_entries() {
        let sizes = parse_sizes("S, M");
        assert_eq!(
            parse_stock("XL:3", &sizes).unwrap_err(),
            FormError::UnknownStockSize("XL".to_string())
        );
        assert_eq!(
            parse_stock("M-3", &sizes).unwrap_err(),
            FormError::InvalidStockEntry("M-3".to_string())
        );
        assert!(parse_stock("M:-1", &sizes).is_err());
        assert_eq!(parse_stock("", &sizes).unwrap().len(), 2);
    }

    #[test]
    fn test_sizes_are_deduplicated() {
        assert_eq!(parse_sizes("S, M ,,L, M"), vec!["S", "M", "L"]);
        let mut f = form();
        f.sizes = " , ".to_string();
        assert_eq!(f.validate().unwrap_err(), FormError::NoSizes);
    }

    #[test]
    fn test_accessories() {
        let parsed = parse_accessories("Gift wrap: deluxe:2.25").unwrap();
        assert_eq!(parsed[0].name, "Gift wrap: deluxe");
        assert!(parse_accessories("Belt").is_err());
        assert!(parse_accessories(":5").is_err());
        assert!(parse_accessories("Belt:-1").is_err());
        assert!(parse_accessories(" ; ").unwrap().is_empty());
    }

    #[test]
    fn test_edit_form_round_trips_product() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Linen Shirt".to_string(),
            description: String::new(),
            price: "49.50".parse().unwrap(),
            original_price: Some("60.00".parse().unwrap()),
            category: "Shirts".to_string(),
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            sizes: vec!["S".to_string(), "M".to_string()],
            stock: BTreeMap::from([("M".to_string(), 4), ("S".to_string(), 10)]),
            accessories: vec![Accessory {
                id: AccessoryId::new("x1"),
                name: "Belt".to_string(),
                price: "5.00".parse().unwrap(),
            }],
            featured: false,
            created_at: None,
        };

        let form = ProductForm::from_product(&product);
        assert_eq!(form.price, "49.5");
        assert_eq!(form.original_price, "60");
        assert_eq!(form.stock, "S:10, M:4");
        assert_eq!(form.accessories, "Belt:5");
        assert_eq!(form.images, "a.jpg\nb.jpg");

        let payload = form.validate().unwrap();
        assert_eq!(payload.stock, product.stock);
    }

    #[test]
    fn test_push_image() {
        let mut f = ProductForm::default();
        f.push_image("/uploads/1.jpg");
        f.push_image("/uploads/2.jpg");
        assert_eq!(f.images, "/uploads/1.jpg\n/uploads/2.jpg");
    }

    #[test]
    fn test_category_form() {
        let form = CategoryForm {
            name: "  Dresses ".to_string(),
            description: " ".to_string(),
            image: String::new(),
        };
        let payload = form.validate().unwrap();
        assert_eq!(payload.name, "Dresses");
        assert_eq!(payload.description, None);
        assert!(CategoryForm::default().validate().is_err());
    }
}
