//! A stand-in for the REST backend, served from an ephemeral local port.
//!
//! One shopper and one admin account, one product and one pending order.
//! Every bearer token is rejected with `401` once [`FakeBackend::revoke_tokens`]
//! has been called. Only cash on delivery is enabled; after
//! [`FakeBackend::break_payment_settings`] that endpoint answers `500`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub const SHOPPER_EMAIL: &str = "asha@drape.shop";
pub const ADMIN_EMAIL: &str = "ops@drape.shop";
pub const ADMIN_ID: &str = "admin-1";
pub const PASSWORD: &str = "linen-and-silk";
pub const PRODUCT_ID: &str = "tee-1";
pub const ORDER_ID: &str = "66aa0000000000000000c0de";

const SHOPPER_TOKEN: &str = "tok-shopper";
const ADMIN_TOKEN: &str = "tok-admin";

#[derive(Debug)]
struct Shared {
    revoked: AtomicBool,
    settings_broken: AtomicBool,
    order_status: Mutex<String>,
    status_updates: Mutex<Vec<String>>,
    placed_orders: Mutex<Vec<Value>>,
}

/// Handle to a running fake backend. The server stops when this is dropped.
#[derive(Debug)]
pub struct FakeBackend {
    api_url: Url,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl FakeBackend {
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared {
            revoked: AtomicBool::new(false),
            settings_broken: AtomicBool::new(false),
            order_status: Mutex::new("pending".to_string()),
            status_updates: Mutex::new(Vec::new()),
            placed_orders: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/users", get(users))
            .route("/api/products", get(products))
            .route("/api/products/{id}", get(product))
            .route("/api/categories", get(categories))
            .route("/api/payment-settings", get(payment_settings))
            .route("/api/wishlist", get(wishlist))
            .route("/api/orders", get(orders).post(place_order))
            .route("/api/orders/my", get(orders))
            .route("/api/orders/{id}", get(order))
            .route("/api/orders/{id}/status", put(update_status))
            .with_state(Arc::clone(&shared));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            api_url: Url::parse(&format!("http://{addr}/api")).expect("fake backend url"),
            shared,
            task,
        }
    }

    #[must_use]
    pub const fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Reject every token from now on.
    pub fn revoke_tokens(&self) {
        self.shared.revoked.store(true, Ordering::SeqCst);
    }

    /// Make `GET /payment-settings` fail from now on.
    pub fn break_payment_settings(&self) {
        self.shared.settings_broken.store(true, Ordering::SeqCst);
    }

    /// Order payloads the storefront has posted, oldest first.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<Value> {
        self.shared
            .placed_orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Statuses the admin has set on the order, in order.
    #[must_use]
    pub fn status_updates(&self) -> Vec<String> {
        self.shared
            .status_updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// The bearer token, if it is one the backend still accepts.
fn check_token(shared: &Shared, headers: &HeaderMap) -> Result<&'static str, Response> {
    let unauthorized = || api_error(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    if shared.revoked.load(Ordering::SeqCst) {
        return Err(unauthorized());
    }
    match headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        Some(SHOPPER_TOKEN) => Ok(SHOPPER_TOKEN),
        Some(ADMIN_TOKEN) => Ok(ADMIN_TOKEN),
        _ => Err(unauthorized()),
    }
}

fn check_admin(shared: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    match check_token(shared, headers)? {
        ADMIN_TOKEN => Ok(()),
        _ => Err(api_error(StatusCode::FORBIDDEN, "Not authorized as an admin")),
    }
}

fn shopper() -> Value {
    json!({ "_id": "user-1", "name": "Asha Rao", "email": SHOPPER_EMAIL, "role": "user" })
}

fn admin() -> Value {
    json!({ "_id": ADMIN_ID, "name": "Ops Team", "email": ADMIN_EMAIL, "role": "admin" })
}

/// Linen tee: S has 3, M has 5, L is sold out.
fn tee() -> Value {
    json!({
        "_id": PRODUCT_ID,
        "name": "Linen Tee",
        "description": "Breathable linen tee",
        "price": 20,
        "originalPrice": 25,
        "category": "Tops",
        "images": [],
        "sizes": ["S", "M", "L"],
        "stock": { "S": 3, "M": 5, "L": 0 },
        "accessories": [{ "_id": "belt", "name": "Woven Belt", "price": 5 }],
        "featured": true
    })
}

fn the_order(status: &str) -> Value {
    json!({
        "_id": ORDER_ID,
        "user": { "name": "Asha Rao", "email": SHOPPER_EMAIL },
        "items": [{
            "product": PRODUCT_ID,
            "name": "Linen Tee",
            "size": "M",
            "quantity": 2,
            "price": 20
        }],
        "shippingAddress": {
            "fullName": "Asha Rao",
            "email": SHOPPER_EMAIL,
            "phone": "9820012345",
            "street": "12 Hill Road, Bandra",
            "city": "Mumbai",
            "state": "Maharashtra",
            "pincode": "400050"
        },
        "paymentMethod": "cod",
        "subtotal": 40,
        "shippingFee": 5,
        "total": 45,
        "status": status,
        "createdAt": "2026-03-10T10:00:00Z"
    })
}

fn current_status(shared: &Shared) -> String {
    shared
        .order_status
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn login(Json(creds): Json<Credentials>) -> Response {
    if creds.password != PASSWORD {
        return api_error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    match creds.email.as_str() {
        SHOPPER_EMAIL => Json(json!({ "token": SHOPPER_TOKEN, "user": shopper() })).into_response(),
        ADMIN_EMAIL => Json(json!({ "token": ADMIN_TOKEN, "user": admin() })).into_response(),
        _ => api_error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn users(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_admin(&shared, &headers) {
        return rejection;
    }
    Json(json!([admin(), shopper()])).into_response()
}

async fn products() -> Json<Value> {
    Json(json!([tee()]))
}

async fn product(Path(id): Path<String>) -> Response {
    if id == PRODUCT_ID {
        Json(tee()).into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, "Product not found")
    }
}

async fn categories() -> Json<Value> {
    Json(json!([{ "_id": "cat-1", "name": "Tops" }]))
}

async fn payment_settings(State(shared): State<Arc<Shared>>) -> Response {
    if shared.settings_broken.load(Ordering::SeqCst) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Settings unavailable");
    }
    Json(json!({ "codEnabled": true, "upiEnabled": false, "cardEnabled": false })).into_response()
}

async fn place_order(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = check_token(&shared, &headers) {
        return rejection;
    }
    shared
        .placed_orders
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);
    (StatusCode::CREATED, Json(the_order("pending"))).into_response()
}

async fn wishlist(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_token(&shared, &headers) {
        return rejection;
    }
    Json(json!([])).into_response()
}

async fn orders(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_token(&shared, &headers) {
        return rejection;
    }
    Json(json!([the_order(&current_status(&shared))])).into_response()
}

async fn order(State(shared): State<Arc<Shared>>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(rejection) = check_token(&shared, &headers) {
        return rejection;
    }
    if id != ORDER_ID {
        return api_error(StatusCode::NOT_FOUND, "Order not found");
    }
    Json(the_order(&current_status(&shared))).into_response()
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_status(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response {
    if let Err(rejection) = check_admin(&shared, &headers) {
        return rejection;
    }
    if id != ORDER_ID {
        return api_error(StatusCode::NOT_FOUND, "Order not found");
    }
    *shared
        .order_status
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = body.status.clone();
    shared
        .status_updates
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body.status);
    Json(the_order(&current_status(&shared))).into_response()
}
