//! Per-page context shared by every full-page template.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use drape_core::toast::Toast;
use tower_sessions::Session;

use super::{CartStore, take_toasts};
use crate::error::AppError;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::CurrentUser;

/// What the layout needs: the greeting, the cart badge, pending toasts and
/// the CSP nonce.
///
/// Extracting this drains the session's toast queue, so only handlers that
/// render a page should take it; redirecting handlers leave the toasts for
/// the page they redirect to.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user_name: Option<String>,
    pub cart_count: u32,
    pub toasts: Vec<Toast>,
    pub nonce: String,
}

impl PageContext {
    /// Build the context from an already-extracted session.
    ///
    /// For handlers that decide between redirecting and rendering: call this
    /// only once rendering is certain, so queued toasts survive a redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(
        session: &Session,
        user: Option<&CurrentUser>,
        nonce: String,
    ) -> Result<Self, tower_sessions::session::Error> {
        let cart = CartStore::new(session.clone()).load().await?;
        let toasts = take_toasts(session).await?;

        Ok(Self {
            user_name: user.map(|u| u.display_name().to_string()),
            cart_count: cart.total_items(),
            toasts,
            nonce,
        })
    }

    /// Show a toast on the page being rendered now.
    pub fn toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user_name.is_some()
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;
        let Ok(OptionalAuth(user)) = OptionalAuth::from_request_parts(parts, state).await;
        let Ok(CspNonce(nonce)) = CspNonce::from_request_parts(parts, state).await;

        Ok(Self::load(&session, user.as_ref(), nonce).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::services::push_toast;

    #[tokio::test]
    async fn test_load_drains_toasts() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_toast(&session, Toast::success("Saved")).await.unwrap();

        let page = PageContext::load(&session, None, "n0nce".to_string())
            .await
            .unwrap();
        assert_eq!(page.toasts.len(), 1);
        assert_eq!(page.cart_count, 0);
        assert!(!page.is_logged_in());

        let again = PageContext::load(&session, None, String::new()).await.unwrap();
        assert!(again.toasts.is_empty());
    }
}
