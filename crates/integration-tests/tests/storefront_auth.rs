//! Sign-in, protected pages and backend token expiry on the storefront.

use drape_integration_tests::backend::{FakeBackend, PASSWORD, SHOPPER_EMAIL};
use drape_integration_tests::browser::Browser;
use drape_integration_tests::storefront;

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

async fn signed_in(backend: &FakeBackend) -> Browser {
    let mut shop = storefront(backend);
    let login = shop
        .post_form("/auth/login", &[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .await;
    assert!(login.redirects_to("/"), "{login:?}");
    shop
}

#[tokio::test]
async fn test_wrong_password_shows_toast() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    let login = shop
        .post_form("/auth/login", &[("email", SHOPPER_EMAIL), ("password", "nope")])
        .await;
    assert!(login.redirects_to("/auth/login"));

    let page = shop.get("/auth/login").await;
    assert!(page.body.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let backend = FakeBackend::start().await;
    let mut shop = storefront(&backend);

    let wishlist = shop.get("/wishlist").await;
    assert!(wishlist.redirects_to("/auth/login"));
    let page = shop.get("/auth/login").await;
    assert!(page.body.contains("Please log in to continue"));
}

#[tokio::test]
async fn test_signed_in_visitor_sees_wishlist_and_orders() {
    let backend = FakeBackend::start().await;
    let mut shop = signed_in(&backend).await;

    assert!(shop.get("/wishlist").await.status.is_success());
    let orders = shop.get("/orders").await;
    assert!(orders.status.is_success());
    assert!(orders.body.contains("C0DE"), "{}", orders.body);
}

#[tokio::test]
async fn test_revoked_token_signs_visitor_out() {
    let backend = FakeBackend::start().await;
    let mut shop = signed_in(&backend).await;

    backend.revoke_tokens();
    let wishlist = shop.get("/wishlist").await;
    assert!(wishlist.redirects_to("/auth/login"));

    let page = shop.get("/auth/login").await;
    assert!(page.status.is_success());
    assert!(page.body.contains(SESSION_EXPIRED));

    // Signed out, so protected pages bounce without calling the backend.
    let again = shop.get("/orders").await;
    assert!(again.redirects_to("/auth/login"));
}
