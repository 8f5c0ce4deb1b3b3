//! Session cart behaviour through the storefront router.

use drape_integration_tests::backend::{FakeBackend, PRODUCT_ID};
use drape_integration_tests::storefront;

fn add_form<'a>(size: &'a str, quantity: &'a str) -> [(&'static str, &'a str); 3] {
    [("product_id", PRODUCT_ID), ("size", size), ("quantity", quantity)]
}

#[tokio::test]
async fn test_adding_same_selection_merges_lines() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    let added = shop.post_form("/cart/add", &add_form("M", "2")).await;
    assert!(added.redirects_to(&format!("/products/{PRODUCT_ID}")));
    shop.post_form("/cart/add", &add_form("M", "1")).await;

    let count = shop.get("/cart/count").await;
    assert!(count.status.is_success());
    assert!(count.body.contains(">3</span>"), "{}", count.body);

    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Added Linen Tee to cart"));
    assert!(cart.body.contains("Linen Tee"));
}

#[tokio::test]
async fn test_stock_limits_are_enforced() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    shop.post_form("/cart/add", &add_form("S", "3")).await;
    shop.post_form("/cart/add", &add_form("S", "1")).await;
    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Size S is out of stock"), "{}", cart.body);

    shop.post_form("/cart/add", &add_form("M", "6")).await;
    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Only 5 more available in size M"));

    shop.post_form("/cart/add", &add_form("L", "1")).await;
    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Size L is out of stock"));

    let count = shop.get("/cart/count").await;
    assert!(count.body.contains(">3</span>"));
}

#[tokio::test]
async fn test_missing_size_is_rejected() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    shop.post_form("/cart/add", &add_form("", "1")).await;
    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Please select a size"));
}

#[tokio::test]
async fn test_clear_empties_cart() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    shop.post_form("/cart/add", &add_form("M", "2")).await;
    let cleared = shop.post_form("/cart/clear", &[]).await;
    assert!(cleared.redirects_to("/cart"));

    let cart = shop.get("/cart").await;
    assert!(cart.body.contains("Cart cleared"));
    let count = shop.get("/cart/count").await;
    assert!(count.body.contains(">0</span>"));
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let backend = FakeBackend::start().await;
    let mut first = storefront(&backend);
    first.post_form("/cart/add", &add_form("M", "2")).await;

    let mut second = storefront(&backend);
    let count = second.get("/cart/count").await;
    assert!(count.body.contains(">0</span>"));
}
