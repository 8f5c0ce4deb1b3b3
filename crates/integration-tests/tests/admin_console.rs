//! The admin console end to end against the fake backend.

use drape_integration_tests::admin;
use drape_integration_tests::backend::{
    ADMIN_EMAIL, ADMIN_ID, FakeBackend, ORDER_ID, PASSWORD, SHOPPER_EMAIL,
};
use drape_integration_tests::browser::{Browser, FilePart};

async fn signed_in(backend: &FakeBackend) -> Browser {
    let mut console = admin(backend);
    let login = console
        .post_form("/auth/login", &[("email", ADMIN_EMAIL), ("password", PASSWORD)])
        .await;
    assert!(login.redirects_to("/"), "{login:?}");
    console
}

#[tokio::test]
async fn test_shopper_cannot_sign_in() {
    let backend = FakeBackend::start().await;
    let mut console = admin(&backend);

    let login = console
        .post_form("/auth/login", &[("email", SHOPPER_EMAIL), ("password", PASSWORD)])
        .await;
    assert!(login.redirects_to("/auth/login"));
    let page = console.get("/auth/login").await;
    assert!(page.body.contains("This account does not have admin access"));

    assert!(console.get("/").await.redirects_to("/auth/login"));
}

#[tokio::test]
async fn test_dashboard_flags_sold_out_sizes() {
    let backend = FakeBackend::start().await;
    let mut console = signed_in(&backend).await;

    let dashboard = console.get("/").await;
    assert!(dashboard.status.is_success());
    assert!(dashboard.body.contains("Sold out"), "{}", dashboard.body);
    assert!(console.get("/analytics").await.status.is_success());
}

#[tokio::test]
async fn test_order_status_follows_lifecycle() {
    let backend = FakeBackend::start().await;
    let mut console = signed_in(&backend).await;
    let status_url = format!("/orders/{ORDER_ID}/status");
    let order_url = format!("/orders/{ORDER_ID}");

    let skipped = console.post_form(&status_url, &[("status", "shipped")]).await;
    assert!(skipped.redirects_to(&order_url));
    let page = console.get(&order_url).await;
    assert!(page.body.contains("A pending order cannot be marked shipped"));
    assert!(backend.status_updates().is_empty());

    console.post_form(&status_url, &[("status", "processing")]).await;
    let page = console.get(&order_url).await;
    assert!(page.body.contains("marked processing"), "{}", page.body);
    assert_eq!(backend.status_updates(), vec!["processing".to_string()]);
}

#[tokio::test]
async fn test_admin_cannot_demote_self() {
    let backend = FakeBackend::start().await;
    let mut console = signed_in(&backend).await;

    let demote = console
        .post_form(&format!("/users/{ADMIN_ID}/role"), &[("role", "user")])
        .await;
    assert!(demote.redirects_to("/users"));
    let users = console.get("/users").await;
    assert!(users.body.contains("You cannot remove your own admin access"));
}

#[tokio::test]
async fn test_product_upload_rejects_non_images() {
    let backend = FakeBackend::start().await;
    let mut console = signed_in(&backend).await;

    let page = console
        .post_multipart(
            "/products/new",
            &[("name", "Silk Scarf"), ("price", "30"), ("category", "Tops")],
            Some(FilePart {
                field: "image",
                file_name: "notes.pdf",
                content_type: "application/pdf",
                bytes: b"%PDF-1.7",
            }),
        )
        .await;
    assert!(page.status.is_success());
    assert!(page.body.contains("Only image files can be uploaded"));
    assert!(page.body.contains("Silk Scarf"));
}

#[tokio::test]
async fn test_revoked_token_signs_admin_out() {
    let backend = FakeBackend::start().await;
    let mut console = signed_in(&backend).await;

    backend.revoke_tokens();
    assert!(console.get("/orders").await.redirects_to("/auth/login"));
    let page = console.get("/auth/login").await;
    assert!(page.body.contains("Your session has expired. Please log in again."));
}
