//! Product catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use drape_core::ProductId;
use drape_core::catalog::{ProductQuery, ProductSort, available_sizes, related_products};
use drape_core::product::Product;
use tracing::instrument;
use url::form_urlencoded;

use super::views::{ProductCardView, money};
use super::wishlist::load_wishlist;
use crate::backend::BackendError;
use crate::error::{AppError, Result, toast_for};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::PageContext;
use crate::state::AppState;

/// Current filter values, echoed back into the filter form.
#[derive(Debug, Clone, Default)]
pub struct FilterView {
    pub search: String,
    pub category: String,
    pub size: String,
    pub min_price: String,
    pub max_price: String,
    pub in_stock: bool,
    pub sort: &'static str,
}

impl From<&ProductQuery> for FilterView {
    fn from(q: &ProductQuery) -> Self {
        Self {
            search: q.search.clone().unwrap_or_default(),
            category: q.category.clone().unwrap_or_default(),
            size: q.size.clone().unwrap_or_default(),
            min_price: q.min_price.map(|d| d.to_string()).unwrap_or_default(),
            max_price: q.max_price.map(|d| d.to_string()).unwrap_or_default(),
            in_stock: q.in_stock == Some(true),
            sort: q.sort().as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub filter: FilterView,
    pub categories: Vec<String>,
    pub sizes: Vec<String>,
    pub sort_options: Vec<SortOptionView>,
    pub total: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Query string for `query` with the page replaced.
fn page_url(query: &ProductQuery, page: usize) -> String {
    let mut qs = form_urlencoded::Serializer::new(String::new());
    let pairs = [
        ("search", query.search.clone()),
        ("category", query.category.clone()),
        ("size", query.size.clone()),
        ("min_price", query.min_price.map(|d| d.to_string())),
        ("max_price", query.max_price.map(|d| d.to_string())),
        ("in_stock", query.in_stock.map(|b| b.to_string())),
        ("sort", query.sort.map(|s| s.as_str().to_string())),
    ];
    for (key, value) in pairs {
        if let Some(value) = value {
            qs.append_pair(key, &value);
        }
    }
    qs.append_pair("page", &page.to_string());
    format!("/products?{}", qs.finish())
}

/// Display the filtered catalog.
#[instrument(skip(state, user, page))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    mut page: PageContext,
    Query(query): Query<ProductQuery>,
) -> Result<ProductsIndexTemplate> {
    let products = match state.backend().list_products().await {
        Ok(products) => products,
        Err(e) => {
            page.toast(toast_for(e)?);
            Vec::new()
        }
    };
    let categories = match state.backend().list_categories().await {
        Ok(categories) => categories.into_iter().map(|c| c.name).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for catalog");
            Vec::new()
        }
    };
    let wishlist = load_wishlist(&state, user.as_ref()).await?;

    let result = query.apply(&products);

    Ok(ProductsIndexTemplate {
        page,
        products: ProductCardView::list(&result.items, &wishlist),
        filter: FilterView::from(&query),
        categories,
        sizes: available_sizes(&products),
        sort_options: ProductSort::all()
            .into_iter()
            .map(|s| SortOptionView {
                value: s.as_str(),
                label: s.label(),
            })
            .collect(),
        total: result.total,
        current_page: result.page,
        total_pages: result.total_pages,
        prev_url: result.has_prev().then(|| page_url(&query, result.page - 1)),
        next_url: result.has_next().then(|| page_url(&query, result.page + 1)),
    })
}

#[derive(Debug, Clone)]
pub struct SizeOptionView {
    pub label: String,
    pub stock: u32,
    pub available: bool,
    /// "Only 2 left" style hint for low stock.
    pub hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccessoryOptionView {
    pub id: String,
    pub name: String,
    pub price: String,
}

/// Below this many units a size shows an "only N left" hint.
const LOW_STOCK_HINT: u32 = 3;

#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub images: Vec<String>,
    pub sizes: Vec<SizeOptionView>,
    pub accessories: Vec<AccessoryOptionView>,
    pub in_stock: bool,
}

impl From<&Product> for ProductDetailView {
    fn from(p: &Product) -> Self {
        let discount_percent = p.discount_percent();
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            description: p.description.clone(),
            category: p.category.clone(),
            price: p.price_display(),
            original_price: discount_percent.and(p.original_price).map(money),
            discount_percent,
            images: p.images.clone(),
            sizes: p
                .sizes
                .iter()
                .map(|size| {
                    let stock = p.stock_for(size);
                    SizeOptionView {
                        label: size.clone(),
                        stock,
                        available: stock > 0,
                        hint: (stock > 0 && stock <= LOW_STOCK_HINT)
                            .then(|| format!("Only {stock} left")),
                    }
                })
                .collect(),
            accessories: p
                .accessories
                .iter()
                .map(|a| AccessoryOptionView {
                    id: a.id.to_string(),
                    name: a.name.clone(),
                    price: money(a.price),
                })
                .collect(),
            in_stock: p.in_stock(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub related: Vec<ProductCardView>,
    pub wishlisted: bool,
    pub logged_in: bool,
}

/// Display a product.
#[instrument(skip(state, user, page))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let id = ProductId::new(id);
    let product = state.backend().get_product(&id).await.map_err(|e| match e {
        BackendError::NotFound => AppError::NotFound(format!("product {id}")),
        other => AppError::Backend(other),
    })?;

    let related = match state.backend().list_products().await {
        Ok(all) => related_products(&product, &all),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load related products");
            Vec::new()
        }
    };
    let wishlist = load_wishlist(&state, user.as_ref()).await?;

    Ok(ProductShowTemplate {
        wishlisted: wishlist.contains(&product.id),
        logged_in: user.is_some(),
        related: ProductCardView::list(&related, &wishlist),
        product: ProductDetailView::from(&product),
        page,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_page_url_keeps_filters() {
        let query = ProductQuery {
            search: Some("linen shirt".to_string()),
            max_price: Some(Decimal::from(50)),
            sort: Some(ProductSort::PriceAsc),
            ..ProductQuery::default()
        };
        assert_eq!(
            page_url(&query, 2),
            "/products?search=linen+shirt&max_price=50&sort=price-asc&page=2"
        );
        assert_eq!(page_url(&ProductQuery::default(), 1), "/products?page=1");
    }

    #[test]
    fn test_filter_view_defaults() {
        let view = FilterView::from(&ProductQuery::default());
        assert_eq!(view.sort, "featured");
        assert!(view.search.is_empty());
        assert!(!view.in_stock);
    }
}
