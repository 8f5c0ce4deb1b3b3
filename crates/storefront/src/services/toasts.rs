//! One-shot notifications stored in the session until the next page render.

use drape_core::toast::Toast;
use tower_sessions::Session;

use crate::models::session_keys;

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_toast(session: &Session, toast: Toast) -> Result<(), tower_sessions::session::Error> {
    let mut toasts: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await?
        .unwrap_or_default();
    toasts.push(toast);
    session.insert(session_keys::TOASTS, toasts).await
}

/// Drain all queued toasts.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_toasts(session: &Session) -> Result<Vec<Toast>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Toast>>(session_keys::TOASTS)
        .await?
        .unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_toasts_are_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_toast(&session, Toast::success("Added to cart")).await.unwrap();
        push_toast(&session, Toast::error("Only 2 left")).await.unwrap();

        let toasts = take_toasts(&session).await.unwrap();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[1].message, "Only 2 left");

        assert!(take_toasts(&session).await.unwrap().is_empty());
    }
}
