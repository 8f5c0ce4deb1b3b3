//! Layout context for admin pages.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use drape_core::toast::Toast;
use tower_sessions::Session;

use super::take_toasts;
use crate::error::AppError;
use crate::middleware::OptionalAdmin;
use crate::models::CurrentAdmin;

/// The signed-in admin's name and the toasts to show.
///
/// Extracting it drains the toast queue; take it only in handlers that
/// render a page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub admin_name: Option<String>,
    pub toasts: Vec<Toast>,
}

impl PageContext {
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(
        session: &Session,
        admin: Option<&CurrentAdmin>,
    ) -> Result<Self, tower_sessions::session::Error> {
        Ok(Self {
            admin_name: admin.map(|a| a.display_name().to_string()),
            toasts: take_toasts(session).await?,
        })
    }

    pub fn toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
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
        let Ok(OptionalAdmin(admin)) = OptionalAdmin::from_request_parts(parts, state).await;

        Ok(Self::load(&session, admin.as_ref()).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::services::push_toast;

    #[tokio::test]
    async fn test_toasts_are_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_toast(&session, Toast::success("Product saved")).await.unwrap();
        push_toast(&session, Toast::error("Upload failed")).await.unwrap();

        let page = PageContext::load(&session, None).await.unwrap();
        assert_eq!(page.toasts.len(), 2);
        assert_eq!(page.toasts[1].message, "Upload failed");
        assert!(page.admin_name.is_none());

        let again = PageContext::load(&session, None).await.unwrap();
        assert!(again.toasts.is_empty());
    }
}
