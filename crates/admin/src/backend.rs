//! REST backend client for the admin console.
//!
//! Same backend as the storefront, but every call past login carries the
//! admin's bearer token and nothing is cached: the console must always show
//! the backend's current state.

use std::sync::Arc;

use drape_core::checkout::PaymentSettings;
use drape_core::order::{Order, OrderStatus};
use drape_core::product::{Category, Product};
use drape_core::user::{AuthResponse, LoginRequest, User, UserRole};
use drape_core::{CategoryId, OrderId, ProductId, UserId};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::AdminConfig;
use crate::forms::{CategoryPayload, ProductPayload};
use crate::models::AdminToken;

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

    /// The token is valid but lacks permission.
    #[error("Forbidden")]
    Forbidden,

    /// The requested resource does not exist.
    #[error("Not found")]
    NotFound,

    /// Any other non-success status.
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    /// Upload succeeded but the response named no image URL.
    #[error("Upload response did not include an image URL")]
    MissingUploadUrl,

    /// The configured base URL cannot take path segments.
    #[error("Backend base URL cannot be used as a base")]
    InvalidBaseUrl,
}

impl BackendError {
    /// Message safe to show an operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::NotFound => "That record no longer exists.".to_string(),
            Self::Forbidden => "Your account is not allowed to do that.".to_string(),
            Self::Unauthorized => "Please log in to continue.".to_string(),
            Self::MissingUploadUrl => "The image upload did not return a URL.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::InvalidBaseUrl | Self::MissingUploadUrl => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Unauthorized | Self::Forbidden | Self::NotFound => false,
        }
    }
}

/// An image file received from the product form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload responses name the stored file under one of these keys.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    url: Option<String>,
    image_url: Option<String>,
    path: Option<String>,
}

impl UploadResponse {
    fn into_url(self) -> Option<String> {
        self.url
            .or(self.image_url)
            .or(self.path)
            .filter(|u| !u.trim().is_empty())
    }
}

/// Client for the REST backend. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL
    /// cannot carry path segments.
    pub fn new(config: &AdminConfig) -> Result<Self, BackendError> {
        if config.api_url.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl);
        }

        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .user_agent(concat!("drape-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&AdminToken>,
    ) -> Result<RequestBuilder, BackendError> {
        let url = join_segments(&self.inner.base_url, segments)?;
        let request = self.inner.client.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        })
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        Err(error_for_status(status, &body))
    }

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

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send_raw(request).await.map(drop)
    }

    // =========================================================================
    // Auth and users
    // =========================================================================

    /// Exchange credentials for a bearer token and profile.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for wrong credentials.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        let req = self.request(Method::POST, &["auth", "login"], None)?.json(request);
        self.send(req).await
    }

    /// Every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn list_users(&self, token: &AdminToken) -> Result<Vec<User>, BackendError> {
        self.send(self.request(Method::GET, &["auth", "users"], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(user_id = %id, role = role.as_str()))]
    pub async fn set_user_role(
        &self,
        token: &AdminToken,
        id: &UserId,
        role: UserRole,
    ) -> Result<(), BackendError> {
        let req = self
            .request(Method::PUT, &["auth", "users", id.as_str(), "role"], Some(token))?
            .json(&json!({ "role": role }));
        self.send_empty(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &AdminToken, id: &UserId) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::DELETE, &["auth", "users", id.as_str()], Some(token))?)
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn list_products(&self, token: &AdminToken) -> Result<Vec<Product>, BackendError> {
        self.send(self.request(Method::GET, &["products"], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: &AdminToken,
        id: &ProductId,
    ) -> Result<Product, BackendError> {
        self.send(self.request(Method::GET, &["products", id.as_str()], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend rejects the product.
    #[instrument(skip_all, fields(name = %product.name))]
    pub async fn create_product(
        &self,
        token: &AdminToken,
        product: &ProductPayload,
    ) -> Result<Product, BackendError> {
        let req = self
            .request(Method::POST, &["products"], Some(token))?
            .json(product);
        self.send(req).await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend rejects the product.
    #[instrument(skip(self, token, product), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AdminToken,
        id: &ProductId,
        product: &ProductPayload,
    ) -> Result<Product, BackendError> {
        let req = self
            .request(Method::PUT, &["products", id.as_str()], Some(token))?
            .json(product);
        self.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &AdminToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::DELETE, &["products", id.as_str()], Some(token))?)
            .await
    }

    /// Upload a product image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the response names no URL.
    #[instrument(skip(self, token, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    pub async fn upload_image(
        &self,
        token: &AdminToken,
        image: ImageUpload,
    ) -> Result<String, BackendError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("image", part);

        let req = self
            .request(Method::POST, &["upload"], Some(token))?
            .multipart(form);
        let response: UploadResponse = self.send(req).await?;
        response.into_url().ok_or(BackendError::MissingUploadUrl)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn list_categories(&self, token: &AdminToken) -> Result<Vec<Category>, BackendError> {
        self.send(self.request(Method::GET, &["categories"], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend rejects the category.
    #[instrument(skip_all, fields(name = %category.name))]
    pub async fn create_category(
        &self,
        token: &AdminToken,
        category: &CategoryPayload,
    ) -> Result<Category, BackendError> {
        let req = self
            .request(Method::POST, &["categories"], Some(token))?
            .json(category);
        self.send(req).await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend rejects the category.
    #[instrument(skip(self, token, category), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &AdminToken,
        id: &CategoryId,
        category: &CategoryPayload,
    ) -> Result<Category, BackendError> {
        let req = self
            .request(Method::PUT, &["categories", id.as_str()], Some(token))?
            .json(category);
        self.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        token: &AdminToken,
        id: &CategoryId,
    ) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::DELETE, &["categories", id.as_str()], Some(token))?)
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn list_orders(&self, token: &AdminToken) -> Result<Vec<Order>, BackendError> {
        let mut orders: Vec<Order> = self
            .send(self.request(Method::GET, &["orders"], Some(token))?)
            .await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &AdminToken, id: &OrderId) -> Result<Order, BackendError> {
        self.send(self.request(Method::GET, &["orders", id.as_str()], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend refuses the change.
    #[instrument(skip(self, token), fields(order_id = %id, status = status.as_str()))]
    pub async fn update_order_status(
        &self,
        token: &AdminToken,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        let req = self
            .request(Method::PUT, &["orders", id.as_str(), "status"], Some(token))?
            .json(&json!({ "status": status }));
        self.send_empty(req).await
    }

    // =========================================================================
    // Payment settings
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn payment_settings(&self, token: &AdminToken) -> Result<PaymentSettings, BackendError> {
        self.send(self.request(Method::GET, &["payment-settings"], Some(token))?)
            .await
    }

    /// # Errors
    ///
    /// Returns an API error if the backend rejects the settings.
    #[instrument(skip(self, token))]
    pub async fn update_payment_settings(
        &self,
        token: &AdminToken,
        settings: &PaymentSettings,
    ) -> Result<(), BackendError> {
        let req = self
            .request(Method::PUT, &["payment-settings"], Some(token))?
            .json(settings);
        self.send_empty(req).await
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
        StatusCode::FORBIDDEN => BackendError::Forbidden,
        StatusCode::NOT_FOUND => BackendError::NotFound,
        _ => {
            if status.is_server_error() {
                tracing::error!(status = %status, body = %truncate(body, 500), "Backend returned server error");
            } else {
                tracing::warn!(status = %status, body = %truncate(body, 500), "Backend rejected request");
            }
            BackendError::Api {
                status: status.as_u16(),
                message: extract_message(body),
            }
        }
    }
}

/// `message` or `error` from a JSON error body.
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
    fn test_upload_response_aliases() {
        let parse = |body: &str| {
            serde_json::from_str::<UploadResponse>(body)
                .unwrap()
                .into_url()
        };
        assert_eq!(
            parse(r#"{"url":"https://cdn.drape.shop/a.jpg"}"#).as_deref(),
            Some("https://cdn.drape.shop/a.jpg")
        );
        assert_eq!(
            parse(r#"{"imageUrl":"/uploads/b.png"}"#).as_deref(),
            Some("/uploads/b.png")
        );
        assert_eq!(parse(r#"{"path":"/uploads/c.webp"}"#).as_deref(), Some("/uploads/c.webp"));
        assert_eq!(parse(r#"{"url":"  "}"#), None);
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, ""),
            BackendError::Forbidden
        ));
        let err = error_for_status(
            StatusCode::CONFLICT,
            r#"{"error":"Category has products"}"#,
        );
        assert_eq!(err.user_message(), "Category has products");
        assert!(!err.is_server_error());
        assert!(error_for_status(StatusCode::SERVICE_UNAVAILABLE, "").is_server_error());
    }

    #[test]
    fn test_join_segments() {
        let base = Url::parse("http://localhost:5000/api/").unwrap();
        let url = join_segments(&base, &["auth", "users", "u 1", "role"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/auth/users/u%201/role");
    }
}
