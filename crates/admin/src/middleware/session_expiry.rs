//! Signs the admin out when the backend stops accepting their token.

use axum::{extract::Request, middleware::Next, response::Response};
use drape_core::toast::Toast;
use tower_sessions::Session;

use super::auth::clear_current_admin;
use crate::error::{SessionExpired, clear_sentry_user};
use crate::services::push_toast;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("Backend rejected admin token, signing out");
        if let Err(e) = clear_current_admin(&session).await {
            tracing::error!(error = %e, "Failed to clear expired admin session");
        }
        if let Err(e) = push_toast(&session, Toast::info(SESSION_EXPIRED_MESSAGE)).await {
            tracing::warn!(error = %e, "Failed to queue session expiry toast");
        }
        clear_sentry_user();
    }

    response
}
