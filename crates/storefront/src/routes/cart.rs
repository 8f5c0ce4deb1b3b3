//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation is a form post
//! that applies the change through [`CartStore`], queues a toast describing
//! the outcome and redirects (post/redirect/get). A rejected change leaves the
//! stored cart untouched.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use drape_core::cart::CartError;
use drape_core::toast::Toast;
use drape_core::{AccessoryId, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CartView, safe_return_to};
use crate::backend::BackendError;
use crate::error::{AppError, Result, add_breadcrumb, toast_for};
use crate::filters;
use crate::services::{CartStore, CartStoreError, PageContext, push_toast};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    store: CartStore,
    page: PageContext,
) -> Result<CartShowTemplate> {
    let cart = store.load().await?;
    Ok(CartShowTemplate {
        cart: CartView::new(&cart, state.shipping().free_shipping_threshold()),
        page,
    })
}

/// Add-to-cart submission.
///
/// Accessories arrive as repeated `accessories` fields, so the form is read
/// as raw pairs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AddToCartForm {
    pub product_id: String,
    pub size: String,
    pub quantity: Option<String>,
    pub accessories: Vec<AccessoryId>,
    pub return_to: Option<String>,
}

impl AddToCartForm {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "product_id" => form.product_id = value,
                "size" => form.size = value,
                "quantity" => form.quantity = Some(value),
                "accessories" if !value.is_empty() => form.accessories.push(AccessoryId::new(value)),
                "return_to" => form.return_to = Some(value),
                _ => {}
            }
        }
        form
    }
}

/// Quantity from a form field; blank means 1.
fn parse_quantity(raw: Option<&str>) -> std::result::Result<i64, CartError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(s) => s.parse().map_err(|_| CartError::InvalidQuantity),
    }
}

/// Queue the toast for a cart change that did not go through.
async fn report_cart_error(session: &Session, err: CartStoreError) -> Result<()> {
    match err {
        CartStoreError::Cart(e) => {
            tracing::debug!(error = %e, "Cart change rejected");
            push_toast(session, Toast::error(e.to_string())).await?;
            Ok(())
        }
        CartStoreError::Session(e) => Err(AppError::Session(e)),
    }
}

/// Add a product selection to the cart.
///
/// Stock is checked against a fresh read of the product, not the catalog
/// page the visitor submitted from.
#[instrument(skip(state, session, store, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    store: CartStore,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = AddToCartForm::from_pairs(form);
    let product_id = ProductId::new(form.product_id.trim());
    let back = safe_return_to(form.return_to.as_deref(), &format!("/products/{product_id}"));

    let quantity = match parse_quantity(form.quantity.as_deref()) {
        Ok(q) => q,
        Err(e) => {
            push_toast(&session, Toast::error(e.to_string())).await?;
            return Ok(Redirect::to(&back).into_response());
        }
    };
    if form.size.trim().is_empty() {
        push_toast(&session, Toast::error("Please select a size")).await?;
        return Ok(Redirect::to(&back).into_response());
    }

    let product = match state.backend().get_product(&product_id).await {
        Ok(product) => product,
        Err(BackendError::NotFound) => {
            push_toast(&session, Toast::error("That product is no longer available")).await?;
            return Ok(Redirect::to("/products").into_response());
        }
        Err(e) => {
            push_toast(&session, toast_for(e)?).await?;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let size = form.size.trim();
    match store
        .mutate(|cart| cart.add_item(&product, size, quantity, &form.accessories))
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[("product_id", product_id.as_str()), ("size", size)],
            );
            push_toast(&session, Toast::success(format!("Added {} to cart", product.name))).await?;
        }
        Err(e) => report_cart_error(&session, e).await?,
    }

    Ok(Redirect::to(&back).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub size: String,
    pub quantity: String,
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(session, store))]
pub async fn update(
    session: Session,
    store: CartStore,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    let result = match form.quantity.trim().parse::<i64>() {
        Ok(quantity) => {
            store
                .mutate(|cart| cart.update_quantity(&product_id, &form.size, quantity))
                .await
        }
        Err(_) => Err(CartStoreError::Cart(CartError::InvalidQuantity)),
    };

    match result {
        Ok(()) => push_toast(&session, Toast::success("Cart updated")).await?,
        Err(e) => report_cart_error(&session, e).await?,
    }
    Ok(Redirect::to("/cart"))
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub size: String,
}

/// Remove every line for a product in a size.
#[instrument(skip(session, store))]
pub async fn remove(
    session: Session,
    store: CartStore,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    let removed = store
        .mutate(|cart| Ok(cart.remove_item(&product_id, &form.size)))
        .await?;
    if removed > 0 {
        push_toast(&session, Toast::info("Removed from cart")).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(session: Session, store: CartStore) -> Result<Redirect> {
    store.clear().await?;
    push_toast(&session, Toast::info("Cart cleared")).await?;
    Ok(Redirect::to("/cart"))
}

/// Cart count badge.
#[instrument(skip_all)]
pub async fn count(store: CartStore) -> Result<CartCountTemplate> {
    let cart = store.load().await?;
    Ok(CartCountTemplate {
        count: cart.total_items(),
    })
}
