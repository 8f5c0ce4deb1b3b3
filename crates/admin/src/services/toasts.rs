//! One-shot operator notifications kept in the session until the next page.

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
