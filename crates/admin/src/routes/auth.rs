//! Authentication route handlers for admin.
//!
//! Credentials are checked by the backend. Only accounts whose role is
//! `admin` get a session; anyone else is turned away at the door.

use std::fmt;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use drape_core::toast::Toast;
use drape_core::user::{AuthResponse, LoginRequest};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{Result, clear_sentry_user, set_sentry_user, toast_for};
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::models::{AdminToken, CurrentAdmin};
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

pub const NOT_AN_ADMIN_MESSAGE: &str = "This account does not have admin access";

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    page: PageContext,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// GET /auth/login
#[instrument(skip_all)]
async fn login_page(OptionalAdmin(admin): OptionalAdmin, session: Session) -> Result<Response> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = PageContext::load(&session, None).await?;
    Ok(LoginTemplate { page }.into_response())
}

/// Keep the backend's answer only if it names an admin.
fn admin_from(auth: AuthResponse) -> Option<CurrentAdmin> {
    auth.user.is_admin().then(|| CurrentAdmin {
        profile: auth.user,
        token: AdminToken::new(auth.token),
    })
}

/// POST /auth/login
#[instrument(skip(state, session))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let email = form.email.trim().to_lowercase();
    if email.is_empty() || form.password.is_empty() {
        push_toast(&session, Toast::error("Please enter your email and password")).await?;
        return Ok(Redirect::to("/auth/login"));
    }

    let request = LoginRequest {
        email,
        password: form.password,
    };
    let auth = match state.backend().login(&request).await {
        Ok(auth) => auth,
        Err(BackendError::Unauthorized) => {
            push_toast(&session, Toast::error("Invalid email or password")).await?;
            return Ok(Redirect::to("/auth/login"));
        }
        Err(e) => {
            push_toast(&session, toast_for(e)?).await?;
            return Ok(Redirect::to("/auth/login"));
        }
    };

    let Some(admin) = admin_from(auth) else {
        tracing::warn!(email = %request.email, "Non-admin account tried to sign in");
        push_toast(&session, Toast::error(NOT_AN_ADMIN_MESSAGE)).await?;
        return Ok(Redirect::to("/auth/login"));
    };

    session.cycle_id().await?;
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.profile.id, Some(&admin.profile.email));
    tracing::info!(admin_id = %admin.profile.id, "Admin signed in");

    push_toast(
        &session,
        Toast::success(format!("Welcome back, {}!", admin.display_name())),
    )
    .await?;
    Ok(Redirect::to("/"))
}

/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    session.cycle_id().await?;
    push_toast(&session, Toast::info("You have been logged out")).await?;
    Ok(Redirect::to("/auth/login"))
}

#[cfg(test)]
mod tests {
    use drape_core::UserId;
    use drape_core::user::{User, UserRole};

    use super::*;

    fn auth(role: UserRole) -> AuthResponse {
        AuthResponse {
            token: "tok".to_string(),
            user: User {
                id: UserId::new("u9"),
                name: "Dev Sharma".to_string(),
                email: "dev@drape.shop".to_string(),
                role,
                phone: None,
            },
        }
    }

    #[test]
    fn test_only_admins_get_a_session() {
        assert!(admin_from(auth(UserRole::User)).is_none());
        let admin = admin_from(auth(UserRole::Admin));
        assert!(admin.is_some_and(|a| a.token.expose() == "tok"));
    }

    #[test]
    fn test_login_form_debug_hides_password() {
        let form = LoginForm {
            email: "dev@drape.shop".to_string(),
            password: "pa55word!".to_string(),
        };
        assert!(!format!("{form:?}").contains("pa55word!"));
    }
}
