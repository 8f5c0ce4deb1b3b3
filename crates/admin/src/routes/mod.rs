//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action (admins only)
//! POST /auth/logout               - Logout action
//!
//! # Dashboard (every route below requires an admin session)
//! GET  /                          - Headline figures, recent orders, low stock
//! GET  /analytics                 - Revenue trend, status mix, top sellers
//!
//! # Products
//! GET  /products                  - Product list with search
//! GET  /products/new              - New product form
//! POST /products/new              - Create (multipart, optional image)
//! GET  /products/{id}/edit        - Edit form
//! POST /products/{id}/edit        - Update (multipart, optional image)
//! POST /products/{id}/delete      - Delete
//!
//! # Categories
//! GET  /categories                - List with inline edit forms
//! POST /categories                - Create
//! POST /categories/{id}           - Update
//! POST /categories/{id}/delete    - Delete
//!
//! # Orders
//! GET  /orders                    - Order list, filterable by status
//! GET  /orders/{id}               - Order detail
//! POST /orders/{id}/status        - Advance or cancel
//!
//! # Users
//! GET  /users                     - Accounts
//! POST /users/{id}/role           - Promote or demote
//! POST /users/{id}/delete         - Delete
//!
//! # Settings
//! GET  /settings                  - Payment methods
//! POST /settings                  - Save payment methods
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod views;

use axum::Router;

use crate::state::AppState;

/// Every admin page route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(orders::router())
        .merge(users::router())
        .merge(settings::router())
}
