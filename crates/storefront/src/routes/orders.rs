//! Order history and tracking.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use drape_core::OrderId;
use drape_core::checkout::ShippingAddress;
use drape_core::order::{Order, OrderStatus, TrackingStep};
use tracing::instrument;

use super::views::money;
use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::services::PageContext;
use crate::state::AppState;

/// CSS modifier for a status badge.
fn status_class(status: OrderStatus) -> String {
    format!("status--{}", status.as_str())
}

#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub number: String,
    pub placed_on: String,
    pub status: &'static str,
    pub status_class: String,
    pub item_count: u32,
    pub total: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.short_id(),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            status: order.status.label(),
            status_class: status_class(order.status),
            item_count: order.item_count(),
            total: money(order.total),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderRowView>,
}

/// List the visitor's orders, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<OrdersIndexTemplate> {
    let orders = state.backend().my_orders(&user.token).await?;
    Ok(OrdersIndexTemplate {
        orders: orders.iter().map(OrderRowView::from).collect(),
        page,
    })
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub quantity: u32,
    pub accessories: Vec<String>,
    pub line_total: String,
}

#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub number: String,
    pub placed_on: String,
    pub status: &'static str,
    pub status_class: String,
    pub cancelled: bool,
    pub payment_method: &'static str,
    pub items: Vec<OrderItemView>,
    pub address: ShippingAddress,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.short_id(),
            placed_on: order.created_at.format("%d %b %Y, %H:%M").to_string(),
            status: order.status.label(),
            status_class: status_class(order.status),
            cancelled: order.status == OrderStatus::Cancelled,
            payment_method: order.payment_method.label(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    image: item.image.clone(),
                    size: item.size.clone(),
                    quantity: item.quantity,
                    accessories: item.accessories.iter().map(|a| a.name.clone()).collect(),
                    line_total: money(item.line_total()),
                })
                .collect(),
            address: order.shipping_address.clone(),
            subtotal: money(order.subtotal),
            shipping_fee: if order.shipping_fee.is_zero() {
                "Free".to_string()
            } else {
                money(order.shipping_fee)
            },
            total: money(order.total),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetailView,
    pub steps: Vec<TrackingStep>,
}

/// Track one order.
#[instrument(skip(state, user, page))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<OrderShowTemplate> {
    let id = OrderId::new(id);
    let order = state
        .backend()
        .get_order(&user.token, &id)
        .await
        .map_err(|e| match e {
            BackendError::NotFound => AppError::NotFound(format!("order {id}")),
            other => AppError::Backend(other),
        })?;

    Ok(OrderShowTemplate {
        steps: order.timeline(),
        order: OrderDetailView::from(&order),
        page,
    })
}
