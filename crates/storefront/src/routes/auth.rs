//! Authentication route handlers.
//!
//! Credentials go straight to the backend's `/auth` endpoints; on success the
//! bearer token and profile are kept in the session as a [`CurrentUser`].
//! Logging out drops them but leaves the cart in place.

use std::fmt;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use drape_core::Email;
use drape_core::toast::Toast;
use drape_core::user::{AuthResponse, LoginRequest, RegisterRequest};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{Result, clear_sentry_user, set_sentry_user, toast_for};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, SessionToken};
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

/// Shortest password the register form accepts.
const MIN_PASSWORD_LEN: usize = 6;

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

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    /// Check the form locally before calling the backend.
    ///
    /// # Errors
    ///
    /// Returns the message to show the visitor.
    fn validate(&self) -> std::result::Result<RegisterRequest, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name");
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address")?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters");
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match");
        }
        let phone = self.phone.trim();

        Ok(RegisterRequest {
            name: name.to_string(),
            email: email.into_inner(),
            password: self.password.clone(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

/// Display the login page; logged-in visitors go home.
#[instrument(skip_all)]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = PageContext::load(&session, None, nonce).await?;
    Ok(LoginTemplate { page }.into_response())
}

/// Display the registration page; logged-in visitors go home.
#[instrument(skip_all)]
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = PageContext::load(&session, None, nonce).await?;
    Ok(RegisterTemplate { page }.into_response())
}

/// Store the backend's answer in a fresh session id.
async fn sign_in(session: &Session, auth: AuthResponse) -> Result<CurrentUser> {
    session.cycle_id().await?;
    let user = CurrentUser {
        profile: auth.user,
        token: SessionToken::new(auth.token),
    };
    set_current_user(session, &user).await?;
    set_sentry_user(&user.profile.id, Some(&user.profile.email));
    Ok(user)
}

/// Log in with email and password.
#[instrument(skip(state, session))]
pub async fn login(
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
    match state.backend().login(&request).await {
        Ok(auth) => {
            let user = sign_in(&session, auth).await?;
            tracing::info!(user_id = %user.profile.id, "Customer logged in");
            push_toast(
                &session,
                Toast::success(format!("Welcome back, {}!", user.display_name())),
            )
            .await?;
            Ok(Redirect::to("/"))
        }
        Err(BackendError::Unauthorized) => {
            push_toast(&session, Toast::error("Invalid email or password")).await?;
            Ok(Redirect::to("/auth/login"))
        }
        Err(e) => {
            push_toast(&session, toast_for(e)?).await?;
            Ok(Redirect::to("/auth/login"))
        }
    }
}

/// Create an account and log in.
#[instrument(skip(state, session))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let request = match form.validate() {
        Ok(request) => request,
        Err(message) => {
            push_toast(&session, Toast::error(message)).await?;
            return Ok(Redirect::to("/auth/register"));
        }
    };

    match state.backend().register(&request).await {
        Ok(auth) => {
            let user = sign_in(&session, auth).await?;
            tracing::info!(user_id = %user.profile.id, "Customer registered");
            push_toast(
                &session,
                Toast::success(format!("Welcome to Drape, {}!", user.display_name())),
            )
            .await?;
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            let toast = match e {
                BackendError::Unauthorized => Toast::error("Registration was refused"),
                other => toast_for(other)?,
            };
            push_toast(&session, toast).await?;
            Ok(Redirect::to("/auth/register"))
        }
    }
}

/// Log out. The cart is kept.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_toast(&session, Toast::info("You have been logged out")).await?;
    Ok(Redirect::to("/"))
}
