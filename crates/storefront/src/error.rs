//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; clients only ever see safe messages.
//!
//! A backend `401` anywhere becomes [`AppError::SessionExpired`], whose
//! response is a redirect to the login page tagged with [`SessionExpired`] so
//! the session-expiry middleware can sign the visitor out.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use drape_core::toast::Toast;
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::CartStoreError;

/// Response extension marking a response caused by an expired backend token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend no longer accepts the visitor's token.
    #[error("Session expired")]
    SessionExpired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartStoreError> for AppError {
    fn from(err: CartStoreError) -> Self {
        match err {
            CartStoreError::Session(e) => Self::Session(e),
            CartStoreError::Cart(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_server_error(),
            Self::Session(_) | Self::Internal(_) => true,
            Self::SessionExpired | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = match &self {
            Self::SessionExpired | Self::Backend(BackendError::Unauthorized) => {
                return session_expired_response();
            }
            Self::Backend(BackendError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::Backend(e) if e.is_server_error() => {
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            Self::Backend(e) => (StatusCode::BAD_REQUEST, e.user_message()),
            Self::Session(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, message).into_response()
    }
}

/// Redirect to login, tagged so the expiry middleware logs the visitor out.
fn session_expired_response() -> Response {
    let mut response = Redirect::to("/auth/login").into_response();
    response.extensions_mut().insert(SessionExpired);
    response
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Turn a backend failure into a toast for the visitor.
///
/// A `401` is not recoverable this way and is returned as
/// [`AppError::SessionExpired`]. Server-side failures are still reported to
/// Sentry.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` for [`BackendError::Unauthorized`].
pub fn toast_for(err: BackendError) -> Result<Toast> {
    if matches!(err, BackendError::Unauthorized) {
        return Err(AppError::SessionExpired);
    }
    if err.is_server_error() {
        let event_id = sentry::capture_error(&err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Backend call failed");
    }
    Ok(Toast::error(err.user_message()))
}

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Api {
                status: 503,
                message: None
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_redirects_and_marks_response() {
        for err in [
            AppError::SessionExpired,
            AppError::Backend(BackendError::Unauthorized),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(
                response.headers().get(LOCATION).map(|v| v.as_bytes()),
                Some(b"/auth/login".as_slice())
            );
            assert!(response.extensions().get::<SessionExpired>().is_some());
        }
    }

    #[test]
    fn test_toast_for() {
        let toast = toast_for(BackendError::Api {
            status: 409,
            message: Some("Email already registered".to_string()),
        });
        assert!(matches!(toast, Ok(t) if t.message == "Email already registered"));

        assert!(matches!(
            toast_for(BackendError::Unauthorized),
            Err(AppError::SessionExpired)
        ));
    }
}
