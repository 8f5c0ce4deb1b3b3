//! Authentication extractors for admin.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in admin.
///
/// Redirects to the login page when nobody is signed in, and answers 403 if
/// the stored profile somehow lacks the `admin` role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name())
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when a page needs a signed-in admin.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Session layer missing.
    Unauthorized,
    /// Signed in without the admin role.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, "This account does not have admin access").into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        if !admin.profile.is_admin() {
            return Err(AdminAuthRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use drape_core::UserId;
    use drape_core::user::{User, UserRole};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::AdminToken;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn parts(session: &Session) -> Parts {
        let (mut parts, ()) = Request::builder()
            .uri("/products")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session.clone());
        parts
    }

    fn admin(role: UserRole) -> CurrentAdmin {
        CurrentAdmin {
            profile: User {
                id: UserId::new("a1"),
                name: "Nisha Kapoor".to_string(),
                email: "nisha@drape.shop".to_string(),
                role,
                phone: None,
            },
            token: AdminToken::new("tok"),
        }
    }

    #[tokio::test]
    async fn test_require_admin_redirects_when_signed_out() {
        let session = session();
        let result = RequireAdmin::from_request_parts(&mut parts(&session), &()).await;
        assert!(matches!(result, Err(AdminAuthRejection::RedirectToLogin)));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_customer_profile() {
        let session = session();
        set_current_admin(&session, &admin(UserRole::User)).await.unwrap();
        let result = RequireAdmin::from_request_parts(&mut parts(&session), &()).await;
        assert!(matches!(result, Err(AdminAuthRejection::Forbidden)));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = session();
        set_current_admin(&session, &admin(UserRole::Admin)).await.unwrap();
        let RequireAdmin(found) = RequireAdmin::from_request_parts(&mut parts(&session), &())
            .await
            .unwrap();
        assert_eq!(found.display_name(), "Nisha");

        clear_current_admin(&session).await.unwrap();
        let OptionalAdmin(found) = OptionalAdmin::from_request_parts(&mut parts(&session), &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
