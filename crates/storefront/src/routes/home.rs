//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::views::ProductCardView;
use super::wishlist::load_wishlist;
use crate::error::{Result, toast_for};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::PageContext;
use crate::state::AppState;

/// Products shown in the featured grid.
const FEATURED_LIMIT: usize = 8;

#[derive(Debug, Clone)]
pub struct CategoryLinkView {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCardView>,
    pub categories: Vec<CategoryLinkView>,
}

/// Display the home page.
///
/// Featured products lead; if none are flagged the newest catalog entries fill
/// the grid. A backend outage renders an empty page with a toast.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    mut page: PageContext,
) -> Result<HomeTemplate> {
    let products = match state.backend().list_products().await {
        Ok(products) => products,
        Err(e) => {
            page.toast(toast_for(e)?);
            Vec::new()
        }
    };
    let categories = match state.backend().list_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for home page");
            Vec::new()
        }
    };

    let mut featured: Vec<_> = products.iter().filter(|p| p.featured).cloned().collect();
    if featured.is_empty() {
        featured = products;
    }
    featured.truncate(FEATURED_LIMIT);

    let wishlist = load_wishlist(&state, user.as_ref()).await?;

    Ok(HomeTemplate {
        page,
        featured: ProductCardView::list(&featured, &wishlist),
        categories: categories
            .into_iter()
            .map(|c| CategoryLinkView {
                name: c.name,
                image: c.image,
            })
            .collect(),
    })
}
