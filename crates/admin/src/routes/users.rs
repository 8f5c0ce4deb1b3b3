//! User accounts: list, promote or demote, delete.
//!
//! An admin can never demote or delete their own account from here, so the
//! console always keeps at least the operator who is using it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use drape_core::UserId;
use drape_core::toast::Toast;
use drape_core::user::{User, UserRole};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::or_toast;
use crate::backend::BackendError;
use crate::error::{Result, add_breadcrumb, toast_for};
use crate::middleware::RequireAdmin;
use crate::models::CurrentAdmin;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

pub const SELF_DEMOTION_MESSAGE: &str = "You cannot remove your own admin access";
pub const SELF_DELETION_MESSAGE: &str = "You cannot delete your own account";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{id}/role", post(set_role))
        .route("/users/{id}/delete", post(delete))
}

#[derive(Debug, Clone)]
pub struct UserRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub is_self: bool,
}

impl UserRowView {
    fn new(user: &User, me: &CurrentAdmin) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            is_admin: user.is_admin(),
            is_self: user.id == me.profile.id,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
struct UsersTemplate {
    page: PageContext,
    users: Vec<UserRowView>,
    admin_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// GET /users
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
) -> Result<UsersTemplate> {
    let users = or_toast(&mut page, state.backend().list_users(&admin.token).await)?;

    Ok(UsersTemplate {
        admin_count: users.iter().filter(|u| u.is_admin()).count(),
        users: users.iter().map(|u| UserRowView::new(u, &admin)).collect(),
        page,
    })
}

/// POST /users/{id}/role
#[instrument(skip(state, admin, session))]
async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    let toast = match form.role.trim().parse::<UserRole>() {
        Err(e) => Toast::error(format!("Cannot assign {e}")),
        Ok(role) if id == admin.profile.id && role != UserRole::Admin => {
            Toast::error(SELF_DEMOTION_MESSAGE)
        }
        Ok(role) => match state.backend().set_user_role(&admin.token, &id, role).await {
            Ok(()) => {
                add_breadcrumb("user", "Role changed", &[("user_id", id.as_str()), ("role", role.as_str())]);
                tracing::info!(user_id = %id, role = role.as_str(), "User role changed");
                Toast::success(match role {
                    UserRole::Admin => "User promoted to admin",
                    UserRole::User => "Admin access removed",
                })
            }
            Err(BackendError::NotFound) => Toast::error("That user no longer exists"),
            Err(e) => toast_for(e)?,
        },
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/users"))
}

/// POST /users/{id}/delete
#[instrument(skip(state, admin, session))]
async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    let toast = if id == admin.profile.id {
        Toast::error(SELF_DELETION_MESSAGE)
    } else {
        match state.backend().delete_user(&admin.token, &id).await {
            Ok(()) | Err(BackendError::NotFound) => {
                add_breadcrumb("user", "deleted", &[("user_id", id.as_str())]);
                tracing::info!(user_id = %id, "User deleted");
                Toast::success("User deleted")
            }
            Err(e) => toast_for(e)?,
        }
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/users"))
}

#[cfg(test)]
mod tests {
    use crate::models::AdminToken;

    use super::*;

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: UserId::new(id),
            name: "Meera Iyer".to_string(),
            email: format!("{id}@drape.shop"),
            role,
            phone: None,
        }
    }

    #[test]
    fn test_row_marks_signed_in_admin() {
        let me = CurrentAdmin {
            profile: user("a1", UserRole::Admin),
            token: AdminToken::new("t"),
        };
        assert!(UserRowView::new(&user("a1", UserRole::Admin), &me).is_self);

        let other = UserRowView::new(&user("u2", UserRole::User), &me);
        assert!(!other.is_self);
        assert!(!other.is_admin);
        assert_eq!(other.phone, "");
    }
}
