//! Placing orders through the storefront checkout.

use drape_integration_tests::backend::{FakeBackend, ORDER_ID, PASSWORD, PRODUCT_ID, SHOPPER_EMAIL};
use drape_integration_tests::browser::Browser;
use drape_integration_tests::storefront;

/// Signed in with two mediums in the cart.
async fn ready_to_check_out(backend: &FakeBackend) -> Browser {
    let mut shop = storefront(backend);
    let login = shop
        .post_form("/auth/login", &[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .await;
    assert!(login.redirects_to("/"), "{login:?}");
    shop.post_form(
        "/cart/add",
        &[("product_id", PRODUCT_ID), ("size", "M"), ("quantity", "2")],
    )
    .await;
    assert!(shop.get("/cart/count").await.body.contains(">2</span>"));
    shop
}

fn checkout_form<'a>(pincode: &'a str, method: &'a str) -> [(&'static str, &'a str); 8] {
    [
        ("full_name", "Asha Rao"),
        ("email", SHOPPER_EMAIL),
        ("phone", "98200 12345"),
        ("street", "12 Hill Road, Bandra"),
        ("city", "Mumbai"),
        ("state", "Maharashtra"),
        ("pincode", pincode),
        ("payment_method", method),
    ]
}

#[tokio::test]
async fn test_placing_order_clears_cart() {
    let backend = FakeBackend::start().await;
    let mut shop = ready_to_check_out(&backend).await;

    let placed = shop.post_form("/checkout", &checkout_form("400050", "cod")).await;
    assert!(placed.redirects_to(&format!("/orders/{ORDER_ID}")), "{placed:?}");

    let orders = backend.placed_orders();
    assert_eq!(orders.len(), 1);
    let order = orders.first().expect("one order posted");
    assert_eq!(order["paymentMethod"], "cod");
    assert_eq!(order["subtotal"], 40.0);
    assert_eq!(order["shippingFee"], 5.0);
    assert_eq!(order["shippingAddress"]["phone"], "9820012345");

    assert!(shop.get("/cart/count").await.body.contains(">0</span>"));
    let tracking = shop.get(&format!("/orders/{ORDER_ID}")).await;
    assert!(tracking.body.contains("placed. Thank you!"), "{}", tracking.body);
}

#[tokio::test]
async fn test_invalid_address_keeps_cart_and_input() {
    let backend = FakeBackend::start().await;
    let mut shop = ready_to_check_out(&backend).await;

    let page = shop.post_form("/checkout", &checkout_form("12345", "cod")).await;
    assert!(page.status.is_success());
    assert!(page.body.contains("Please enter a valid 6-digit pincode"));
    assert!(page.body.contains("12 Hill Road, Bandra"));

    assert!(backend.placed_orders().is_empty());
    assert!(shop.get("/cart/count").await.body.contains(">2</span>"));
}

#[tokio::test]
async fn test_disabled_payment_method_is_refused() {
    let backend = FakeBackend::start().await;
    let mut shop = ready_to_check_out(&backend).await;

    let page = shop.post_form("/checkout", &checkout_form("400050", "upi")).await;
    assert!(page.status.is_success());
    assert!(page.body.contains("That payment method is not available"));

    assert!(backend.placed_orders().is_empty());
    assert!(shop.get("/cart/count").await.body.contains(">2</span>"));
}

#[tokio::test]
async fn test_unknown_payment_settings_block_placement() {
    let backend = FakeBackend::start().await;
    let mut shop = ready_to_check_out(&backend).await;
    backend.break_payment_settings();

    let form = shop.get("/checkout").await;
    assert!(form.status.is_success());
    assert!(form.body.contains("No payment methods are available right now."));
    assert!(!form.body.contains("value=\"cod\""));

    let page = shop.post_form("/checkout", &checkout_form("400050", "cod")).await;
    assert!(page.body.contains("That payment method is not available"));
    assert!(backend.placed_orders().is_empty());
    assert!(shop.get("/cart/count").await.body.contains(">2</span>"));
}
