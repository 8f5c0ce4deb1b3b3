//! REST backend client.
//!
//! The backend is the system of record for products, categories, orders,
//! accounts and wishlists. JSON over HTTP, bearer-token auth for visitor
//! requests. Catalog reads (products, categories, payment settings) are cached
//! with `moka` for the configured TTL.

mod cache;

use std::sync::Arc;

use drape_core::checkout::{NewOrder, PaymentSettings};
use drape_core::order::Order;
use drape_core::product::{Category, Product};
use drape_core::user::{AuthResponse, LoginRequest, RegisterRequest};
use drape_core::{OrderId, ProductId};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::BackendConfig;
use crate::models::SessionToken;

use cache::{CacheKey, CacheValue};

/// Shown when the backend gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the bearer token (or credentials).
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested resource does not exist.
    #[error("Not found")]
    NotFound,

    /// Any other non-success status.
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    /// The configured base URL cannot take path segments.
    #[error("Backend base URL cannot be used as a base")]
    InvalidBaseUrl,
}

impl BackendError {
    /// Message safe to show a visitor: the backend's own message when it sent
    /// one, otherwise a generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::NotFound => "We couldn't find what you were looking for.".to_string(),
            Self::Unauthorized => "Please log in to continue.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether this is our (or the backend's) fault rather than the visitor's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::InvalidBaseUrl => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Unauthorized | Self::NotFound => false,
        }
    }
}

/// Client for the REST backend.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL
    /// cannot carry path segments.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.api_url.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("drape-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Build `base_url/seg1/seg2...`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        join_segments(&self.inner.base_url, segments)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&SessionToken>,
    ) -> Result<RequestBuilder, BackendError> {
        let request = self.inner.client.request(method, self.endpoint(segments)?);
        Ok(match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        })
    }

    /// Send a request and return the body of a successful response.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        Err(error_for_status(status, &body))
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token and profile.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for wrong credentials, or any
    /// transport/API error.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        let req = self.request(Method::POST, &["auth", "login"], None)?.json(request);
        self.send(req).await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an API error (e.g. email taken) or a transport error.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        let req = self
            .request(Method::POST, &["auth", "register"], None)?
            .json(request);
        self.send(req).await
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send(self.request(Method::GET, &["products"], None)?)
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .send(self.request(Method::GET, &["products", id.as_str()], None)?)
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .send(self.request(Method::GET, &["categories"], None)?)
            .await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    /// Which payment methods checkout may offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn payment_settings(&self) -> Result<PaymentSettings, BackendError> {
        if let Some(CacheValue::PaymentSettings(settings)) =
            self.inner.cache.get(&CacheKey::PaymentSettings).await
        {
            return Ok(settings);
        }

        let settings: PaymentSettings = self
            .send(self.request(Method::GET, &["payment-settings"], None)?)
            .await?;

        self.inner
            .cache
            .insert(
                CacheKey::PaymentSettings,
                CacheValue::PaymentSettings(settings.clone()),
            )
            .await;
        Ok(settings)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order for the signed-in visitor.
    ///
    /// # Errors
    ///
    /// Returns an API error if the backend rejects the order.
    #[instrument(skip_all, fields(items = order.items.len(), total = %order.total))]
    pub async fn place_order(
        &self,
        token: &SessionToken,
        order: &NewOrder,
    ) -> Result<Order, BackendError> {
        let req = self
            .request(Method::POST, &["orders"], Some(token))?
            .json(order);
        self.send(req).await
    }

    /// The signed-in visitor's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &SessionToken) -> Result<Vec<Order>, BackendError> {
        let mut orders: Vec<Order> = self
            .send(self.request(Method::GET, &["orders", "my"], Some(token))?)
            .await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// One of the visitor's orders.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(
        &self,
        token: &SessionToken,
        id: &OrderId,
    ) -> Result<Order, BackendError> {
        self.send(self.request(Method::GET, &["orders", id.as_str()], Some(token))?)
            .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Products on the visitor's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn wishlist(&self, token: &SessionToken) -> Result<Vec<Product>, BackendError> {
        self.send(self.request(Method::GET, &["wishlist"], Some(token))?)
            .await
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn add_to_wishlist(
        &self,
        token: &SessionToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        self.send_raw(self.request(Method::POST, &["wishlist", id.as_str()], Some(token))?)
            .await
            .map(drop)
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &SessionToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        self.send_raw(self.request(Method::DELETE, &["wishlist", id.as_str()], Some(token))?)
            .await
            .map(drop)
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, BackendError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| BackendError::InvalidBaseUrl)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn error_for_status(status: StatusCode, body: &str) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound,
        _ => {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(body, 500),
                    "Backend returned server error"
                );
            } else {
                tracing::warn!(
                    status = %status,
                    body = %truncate(body, 500),
                    "Backend rejected request"
                );
            }
            BackendError::Api {
                status: status.as_u16(),
                message: extract_message(body),
            }
        }
    }
}

/// Pull a human-readable message out of an error body (`message` or `error`).
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments_encodes_ids() {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let url = join_segments(&base, &["products", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/a%2Fb%20c");

        let base = Url::parse("http://localhost:5000/api/").unwrap();
        let url = join_segments(&base, &["orders", "my"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/orders/my");
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message":"Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        assert_eq!(
            extract_message(r#"{"error":"Out of stock"}"#).as_deref(),
            Some("Out of stock")
        );
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_message("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, ""),
            BackendError::Unauthorized
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, ""),
            BackendError::NotFound
        ));
        let err = error_for_status(StatusCode::BAD_REQUEST, r#"{"message":"Invalid pincode"}"#);
        assert_eq!(err.user_message(), "Invalid pincode");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert!(err.is_server_error());
    }
}
