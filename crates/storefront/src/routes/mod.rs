//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//!
//! # Products
//! GET  /products                - Catalog with search, filters, sort, paging
//! GET  /products/{id}           - Product detail
//!
//! # Cart (session-backed, form posts redirect back with a toast)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add a size/accessory selection
//! POST /cart/update             - Set a line's quantity (0 removes)
//! POST /cart/remove             - Remove a product/size
//! POST /cart/clear              - Empty the cart
//! GET  /cart/count              - Cart count badge (fragment)
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                - Saved products
//! POST /wishlist/{id}/toggle    - Add or remove a product
//!
//! # Checkout and orders (requires auth)
//! GET  /checkout                - Address and payment form
//! POST /checkout                - Place the order
//! GET  /checkout/quote          - Live shipping quote (JSON)
//! GET  /orders                  - Order history
//! GET  /orders/{id}             - Order tracking
//!
//! # Auth
//! GET  /auth/login              - Login page
//! POST /auth/login              - Login action (rate limited)
//! GET  /auth/register           - Register page
//! POST /auth/register           - Register action (rate limited)
//! POST /auth/logout             - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the form posts are rate limited; the pages render freely.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/{id}/toggle", post(wishlist::toggle))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place))
        .route("/quote", get(checkout::quote))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
}
