//! Unified error handling for admin.
//!
//! A backend `401` means the admin's token is no longer accepted; the response
//! becomes a login redirect carrying [`SessionExpired`] so the session-expiry
//! middleware signs the admin out. A `403` renders as Forbidden.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use drape_core::toast::Toast;
use thiserror::Error;

use crate::backend::BackendError;

/// Response extension marking a response caused by an expired backend token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend no longer accepts the admin's token.
    #[error("Session expired")]
    SessionExpired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_server_error(),
            Self::Session(_) | Self::Internal(_) => true,
            Self::SessionExpired | Self::NotFound(_) | Self::Forbidden(_) | Self::BadRequest(_) => {
                false
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::SessionExpired | Self::Backend(BackendError::Unauthorized) => {
                let mut response = Redirect::to("/auth/login").into_response();
                response.extensions_mut().insert(SessionExpired);
                return response;
            }
            Self::Backend(BackendError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(BackendError::Forbidden) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Backend(e) if e.is_server_error() => StatusCode::BAD_GATEWAY,
            Self::Backend(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(e) if e.is_server_error() => "External service error".to_string(),
            Self::Backend(e) => e.user_message(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Turn a backend failure into a toast for the operator.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` for [`BackendError::Unauthorized`],
/// which no toast can recover from.
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

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record an admin action for Sentry error reports.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    breadcrumb.data.extend(
        data.iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::String((*v).to_string()))),
    );
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
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Backend(BackendError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Api {
                status: 422,
                message: Some("Price must be positive".to_string()),
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_token_redirects_to_login() {
        let response = AppError::Backend(BackendError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).map(|v| v.as_bytes()),
            Some(b"/auth/login".as_slice())
        );
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
