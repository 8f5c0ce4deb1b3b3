//! Category management on a single page: list, inline edit, create.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use drape_core::CategoryId;
use drape_core::product::{Category, Product};
use drape_core::toast::Toast;
use tower_sessions::Session;
use tracing::instrument;

use super::views::or_toast;
use crate::backend::BackendError;
use crate::error::{Result, add_breadcrumb, toast_for};
use crate::forms::CategoryForm;
use crate::middleware::RequireAdmin;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(create))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/delete", post(delete))
}

#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: String,
    pub form: CategoryForm,
    pub product_count: usize,
}

/// Products are linked to categories by name, case-insensitively.
fn category_rows(categories: &[Category], products: &[Product]) -> Vec<CategoryRowView> {
    categories
        .iter()
        .map(|c| CategoryRowView {
            id: c.id.to_string(),
            form: CategoryForm::from_category(c),
            product_count: products
                .iter()
                .filter(|p| p.category.eq_ignore_ascii_case(&c.name))
                .count(),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
struct CategoriesTemplate {
    page: PageContext,
    categories: Vec<CategoryRowView>,
}

/// GET /categories
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
) -> Result<CategoriesTemplate> {
    let backend = state.backend();
    let (categories, products) = tokio::join!(
        backend.list_categories(&admin.token),
        backend.list_products(&admin.token)
    );
    let categories = or_toast(&mut page, categories)?;
    let products = or_toast(&mut page, products)?;

    Ok(CategoriesTemplate {
        categories: category_rows(&categories, &products),
        page,
    })
}

/// POST /categories
#[instrument(skip(state, admin, session))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let toast = match form.validate() {
        Err(e) => Toast::error(e.to_string()),
        Ok(payload) => match state.backend().create_category(&admin.token, &payload).await {
            Ok(category) => {
                add_breadcrumb("category", "created", &[("category_id", category.id.as_str())]);
                tracing::info!(category_id = %category.id, "Category created");
                Toast::success(format!("Category {} created", category.name))
            }
            Err(e) => toast_for(e)?,
        },
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/categories"))
}

/// POST /categories/{id}
#[instrument(skip(state, admin, session))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let id = CategoryId::new(id);
    let toast = match form.validate() {
        Err(e) => Toast::error(e.to_string()),
        Ok(payload) => match state.backend().update_category(&admin.token, &id, &payload).await {
            Ok(category) => {
                add_breadcrumb("category", "updated", &[("category_id", id.as_str())]);
                Toast::success(format!("Category {} saved", category.name))
            }
            Err(BackendError::NotFound) => Toast::error("That category no longer exists"),
            Err(e) => toast_for(e)?,
        },
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/categories"))
}

/// POST /categories/{id}/delete
#[instrument(skip(state, admin, session))]
async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = CategoryId::new(id);
    let toast = match state.backend().delete_category(&admin.token, &id).await {
        Ok(()) | Err(BackendError::NotFound) => {
            add_breadcrumb("category", "deleted", &[("category_id", id.as_str())]);
            tracing::info!(category_id = %id, "Category deleted");
            Toast::success("Category deleted")
        }
        Err(e) => toast_for(e)?,
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/categories"))
}
