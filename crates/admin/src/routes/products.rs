//! Product management.
//!
//! Create and edit forms are `multipart/form-data` so an image can ride along
//! with the text fields. The image is uploaded to the backend first and its
//! URL appended to the product's image list before validation.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use drape_core::ProductId;
use drape_core::catalog::ProductQuery;
use drape_core::product::Product;
use drape_core::toast::Toast;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{money, or_toast};
use crate::backend::{BackendError, ImageUpload};
use crate::error::{AppError, Result, add_breadcrumb, toast_for};
use crate::forms::ProductForm;
use crate::middleware::RequireAdmin;
use crate::models::CurrentAdmin;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

/// Largest accepted form body, image included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/new", get(new_product).post(create))
        .route("/products/{id}/edit", get(edit).post(update))
        .route("/products/{id}/delete", post(delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub image: Option<String>,
    pub sizes: String,
    pub total_stock: u32,
    pub featured: bool,
}

impl From<&Product> for ProductRowView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            category: p.category.clone(),
            price: money(p.price),
            image: p.primary_image().map(String::from),
            sizes: p.sizes.join(" / "),
            total_stock: p.total_stock(),
            featured: p.featured,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
struct ProductsIndexTemplate {
    page: PageContext,
    search: String,
    products: Vec<ProductRowView>,
    total: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
struct ProductFormTemplate {
    page: PageContext,
    heading: String,
    action: String,
    is_edit: bool,
    form: ProductForm,
    categories: Vec<String>,
}

/// Where a submitted form goes.
#[derive(Debug, Clone)]
enum Target {
    New,
    Existing(ProductId),
}

impl Target {
    fn action(&self) -> String {
        match self {
            Self::New => "/products/new".to_string(),
            Self::Existing(id) => format!("/products/{id}/edit"),
        }
    }

    fn heading(&self, form: &ProductForm) -> String {
        match self {
            Self::New => "New product".to_string(),
            Self::Existing(_) if form.name.trim().is_empty() => "Edit product".to_string(),
            Self::Existing(_) => format!("Edit {}", form.name.trim()),
        }
    }
}

/// Text fields plus the optional image of a product form.
#[derive(Debug, Default)]
struct Submission {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

/// Drain the multipart body. A file input left empty yields no image.
async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut submission = Submission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if !bytes.is_empty() {
                submission.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            submission.fields.insert(name, value);
        }
    }
    Ok(submission)
}

fn is_image(upload: &ImageUpload) -> bool {
    upload.content_type.starts_with("image/")
}

async fn category_names(
    state: &AppState,
    admin: &CurrentAdmin,
    page: &mut PageContext,
) -> Result<Vec<String>> {
    let categories = or_toast(page, state.backend().list_categories(&admin.token).await)?;
    Ok(categories.into_iter().map(|c| c.name).collect())
}

/// Render the form again with the operator's input and one error toast.
async fn form_page(
    state: &AppState,
    admin: &CurrentAdmin,
    session: &Session,
    target: &Target,
    form: ProductForm,
    error: Option<Toast>,
) -> Result<Response> {
    let mut page = PageContext::load(session, Some(admin)).await?;
    if let Some(toast) = error {
        page.toast(toast);
    }
    let categories = category_names(state, admin, &mut page).await?;

    Ok(ProductFormTemplate {
        heading: target.heading(&form),
        action: target.action(),
        is_edit: matches!(target, Target::Existing(_)),
        page,
        form,
        categories,
    }
    .into_response())
}

/// Upload, validate and save a submitted product.
async fn save(
    state: &AppState,
    admin: &CurrentAdmin,
    session: &Session,
    target: Target,
    submission: Submission,
) -> Result<Response> {
    let mut form = ProductForm::from_fields(&submission.fields);

    if let Some(image) = submission.image {
        if !is_image(&image) {
            let toast = Toast::error("Only image files can be uploaded");
            return form_page(state, admin, session, &target, form, Some(toast)).await;
        }
        match state.backend().upload_image(&admin.token, image).await {
            Ok(url) => form.push_image(&url),
            Err(e) => {
                let toast = toast_for(e)?;
                return form_page(state, admin, session, &target, form, Some(toast)).await;
            }
        }
    }

    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(e) => {
            let toast = Toast::error(e.to_string());
            return form_page(state, admin, session, &target, form, Some(toast)).await;
        }
    };

    let backend = state.backend();
    let saved = match &target {
        Target::New => backend.create_product(&admin.token, &payload).await,
        Target::Existing(id) => backend.update_product(&admin.token, id, &payload).await,
    };
    let product = match saved {
        Ok(product) => product,
        Err(e) => {
            let toast = toast_for(e)?;
            return form_page(state, admin, session, &target, form, Some(toast)).await;
        }
    };

    let verb = match target {
        Target::New => "created",
        Target::Existing(_) => "updated",
    };
    add_breadcrumb("product", verb, &[("product_id", product.id.as_str())]);
    tracing::info!(product_id = %product.id, verb, "Product saved");
    push_toast(session, Toast::success(format!("{} {verb}", product.name))).await?;
    Ok(Redirect::to("/products").into_response())
}

/// GET /products
#[instrument(skip(state, admin, page))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
    Query(params): Query<SearchParams>,
) -> Result<ProductsIndexTemplate> {
    let products = or_toast(&mut page, state.backend().list_products(&admin.token).await)?;
    let search = params.search.trim().to_string();
    let query = ProductQuery {
        search: (!search.is_empty()).then(|| search.clone()),
        ..ProductQuery::default()
    };

    Ok(ProductsIndexTemplate {
        products: products
            .iter()
            .filter(|p| query.matches(p))
            .map(ProductRowView::from)
            .collect(),
        total: products.len(),
        search,
        page,
    })
}

/// GET /products/new
#[instrument(skip_all)]
async fn new_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<Response> {
    let form = ProductForm {
        sizes: "S, M, L".to_string(),
        ..ProductForm::default()
    };
    form_page(&state, &admin, &session, &Target::New, form, None).await
}

/// POST /products/new
#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let submission = read_submission(multipart).await?;
    save(&state, &admin, &session, Target::New, submission).await
}

/// GET /products/{id}/edit
#[instrument(skip(state, admin, session))]
async fn edit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let product = match state.backend().get_product(&admin.token, &id).await {
        Ok(product) => product,
        Err(BackendError::NotFound) => {
            push_toast(&session, Toast::error("That product no longer exists")).await?;
            return Ok(Redirect::to("/products").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let form = ProductForm::from_product(&product);
    form_page(&state, &admin, &session, &Target::Existing(id), form, None).await
}

/// POST /products/{id}/edit
#[instrument(skip(state, admin, session, multipart))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let submission = read_submission(multipart).await?;
    let target = Target::Existing(ProductId::new(id));
    save(&state, &admin, &session, target, submission).await
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub name: String,
}

/// POST /products/{id}/delete
#[instrument(skip(state, admin, session))]
async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    let label = if form.name.trim().is_empty() {
        "Product".to_string()
    } else {
        form.name.trim().to_string()
    };

    match state.backend().delete_product(&admin.token, &id).await {
        Ok(()) | Err(BackendError::NotFound) => {
            add_breadcrumb("product", "deleted", &[("product_id", id.as_str())]);
            tracing::info!(product_id = %id, "Product deleted");
            push_toast(&session, Toast::success(format!("{label} deleted"))).await?;
        }
        Err(e) => push_toast(&session, toast_for(e)?).await?,
    }
    Ok(Redirect::to("/products"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_only_image_content_types_accepted() {
        let upload = |content_type: &str| ImageUpload {
            file_name: "look.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0xFF, 0xD8],
        };
        assert!(is_image(&upload("image/jpeg")));
        assert!(is_image(&upload("image/webp")));
        assert!(!is_image(&upload("application/pdf")));
        assert!(!is_image(&upload("text/html")));
    }

    #[test]
    fn test_target_action_and_heading() {
        let form = ProductForm {
            name: " Linen Shirt ".to_string(),
            ..ProductForm::default()
        };
        assert_eq!(Target::New.action(), "/products/new");
        assert_eq!(Target::New.heading(&form), "New product");

        let existing = Target::Existing(ProductId::new("p7"));
        assert_eq!(existing.action(), "/products/p7/edit");
        assert_eq!(existing.heading(&form), "Edit Linen Shirt");
        assert_eq!(existing.heading(&ProductForm::default()), "Edit product");
    }
}
