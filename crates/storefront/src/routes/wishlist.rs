//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use drape_core::ProductId;
use drape_core::toast::Toast;
use drape_core::wishlist::{Wishlist, WishlistChange};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{ProductCardView, safe_return_to};
use crate::backend::BackendError;
use crate::error::{AppError, Result, toast_for};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

/// The visitor's wishlist, or an empty one for guests.
///
/// Used to mark hearts on product grids, so a failed read degrades to an
/// empty list. An expired token still signs the visitor out.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` if the backend rejects the token.
pub async fn load_wishlist(state: &AppState, user: Option<&CurrentUser>) -> Result<Wishlist> {
    let Some(user) = user else {
        return Ok(Wishlist::default());
    };
    match state.backend().wishlist(&user.token).await {
        Ok(products) => Ok(Wishlist::from_products(&products)),
        Err(BackendError::Unauthorized) => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load wishlist");
            Ok(Wishlist::default())
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
}

/// Display the wishlist.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<WishlistTemplate> {
    let products = state.backend().wishlist(&user.token).await?;
    let wishlist = Wishlist::from_products(&products);
    Ok(WishlistTemplate {
        products: ProductCardView::list(&products, &wishlist),
        page,
    })
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub return_to: Option<String>,
}

/// Add the product if absent, remove it if present.
#[instrument(skip(state, user, session))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect> {
    let back = safe_return_to(form.return_to.as_deref(), "/wishlist");
    let id = ProductId::new(id);

    let current = match state.backend().wishlist(&user.token).await {
        Ok(products) => Wishlist::from_products(&products),
        Err(e) => {
            push_toast(&session, toast_for(e)?).await?;
            return Ok(Redirect::to(&back));
        }
    };

    let change = current.toggle_action(&id);
    let result = match change {
        WishlistChange::Added => state.backend().add_to_wishlist(&user.token, &id).await,
        WishlistChange::Removed => state.backend().remove_from_wishlist(&user.token, &id).await,
    };

    let toast = match result {
        Ok(()) => Toast::success(change.message()),
        Err(e) => toast_for(e)?,
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to(&back))
}
