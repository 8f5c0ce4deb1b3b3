//! Order management: list, detail, status changes.
//!
//! Status changes follow the order lifecycle: pending → processing →
//! shipped → delivered, with cancellation allowed until the order ships.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use drape_core::OrderId;
use drape_core::order::{Order, OrderStatus};
use drape_core::toast::Toast;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{OrderRowView, customer_name, money, or_toast, status_class};
use crate::backend::BackendError;
use crate::error::{Result, add_breadcrumb, toast_for};
use crate::middleware::RequireAdmin;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderFilter {
    /// Unknown or blank values mean "all".
    fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct StatusTabView {
    pub value: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

fn status_tabs(orders: &[Order], selected: Option<OrderStatus>) -> Vec<StatusTabView> {
    let mut tabs = vec![StatusTabView {
        value: "",
        label: "All",
        count: orders.len(),
        active: selected.is_none(),
    }];
    tabs.extend(OrderStatus::all().into_iter().map(|status| StatusTabView {
        value: status.as_str(),
        label: status.label(),
        count: orders.iter().filter(|o| o.status == status).count(),
        active: selected == Some(status),
    }));
    tabs
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
struct OrdersIndexTemplate {
    page: PageContext,
    tabs: Vec<StatusTabView>,
    orders: Vec<OrderRowView>,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: String,
    pub accessories: String,
    pub line_total: String,
}

#[derive(Debug, Clone)]
pub struct StatusOptionView {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: String,
    pub short_id: String,
    pub customer: String,
    pub customer_email: String,
    pub placed_at: String,
    pub status_label: &'static str,
    pub status_class: String,
    pub payment_method: &'static str,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub next_statuses: Vec<StatusOptionView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let address = &order.shipping_address;
        let customer_email = order
            .user
            .as_ref()
            .map(|u| u.email.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| address.email.clone());

        Self {
            id: order.id.to_string(),
            short_id: order.short_id(),
            customer: customer_name(order),
            customer_email,
            placed_at: order.created_at.format("%d %b %Y, %H:%M UTC").to_string(),
            status_label: order.status.label(),
            status_class: status_class(order.status),
            payment_method: order.payment_method.label(),
            address_lines: vec![
                address.street.clone(),
                format!("{}, {} {}", address.city, address.state, address.pincode),
            ],
            phone: address.phone.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    size: item.size.clone(),
                    quantity: item.quantity,
                    unit_price: money(item.price),
                    accessories: item
                        .accessories
                        .iter()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    line_total: money(item.line_total()),
                })
                .collect(),
            subtotal: money(order.subtotal),
            shipping_fee: money(order.shipping_fee),
            total: money(order.total),
            next_statuses: order
                .status
                .next_statuses()
                .into_iter()
                .map(|s| StatusOptionView {
                    value: s.as_str(),
                    label: s.label(),
                })
                .collect(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
struct OrderShowTemplate {
    page: PageContext,
    order: OrderDetailView,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Why a status change was refused before calling the backend.
fn check_transition(current: OrderStatus, requested: &str) -> std::result::Result<OrderStatus, String> {
    let next: OrderStatus = requested
        .parse()
        .map_err(|_| format!("Unknown status \"{requested}\""))?;
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(format!(
            "A {} order cannot be marked {}",
            current.as_str(),
            next.as_str()
        ))
    }
}

/// GET /orders
#[instrument(skip(state, admin, page))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
    Query(filter): Query<OrderFilter>,
) -> Result<OrdersIndexTemplate> {
    let orders = or_toast(&mut page, state.backend().list_orders(&admin.token).await)?;
    let selected = filter.status();

    Ok(OrdersIndexTemplate {
        tabs: status_tabs(&orders, selected),
        orders: orders
            .iter()
            .filter(|o| selected.is_none_or(|s| o.status == s))
            .map(OrderRowView::from)
            .collect(),
        page,
    })
}

/// GET /orders/{id}
#[instrument(skip(state, admin, session))]
async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let order = match state.backend().get_order(&admin.token, &OrderId::new(id)).await {
        Ok(order) => order,
        Err(BackendError::NotFound) => {
            push_toast(&session, Toast::error("That order no longer exists")).await?;
            return Ok(Redirect::to("/orders").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let page = PageContext::load(&session, Some(&admin)).await?;
    Ok(OrderShowTemplate {
        page,
        order: OrderDetailView::from(&order),
    }
    .into_response())
}

/// POST /orders/{id}/status
#[instrument(skip(state, admin, session))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let id = OrderId::new(id);
    let back = Redirect::to(&format!("/orders/{id}"));

    let order = state.backend().get_order(&admin.token, &id).await?;
    let next = match check_transition(order.status, form.status.trim()) {
        Ok(next) => next,
        Err(message) => {
            push_toast(&session, Toast::error(message)).await?;
            return Ok(back);
        }
    };

    match state.backend().update_order_status(&admin.token, &id, next).await {
        Ok(()) => {
            add_breadcrumb("order", "Status changed", &[("order_id", id.as_str()), ("status", next.as_str())]);
            tracing::info!(order_id = %id, from = order.status.as_str(), to = next.as_str(), "Order status updated");
            push_toast(
                &session,
                Toast::success(format!("Order #{} marked {}", order.short_id(), next.as_str())),
            )
            .await?;
        }
        Err(e) => push_toast(&session, toast_for(e)?).await?,
    }
    Ok(back)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_check_transition() {
        assert_eq!(
            check_transition(OrderStatus::Pending, "processing"),
            Ok(OrderStatus::Processing)
        );
        assert_eq!(
            check_transition(OrderStatus::Shipped, "cancelled").unwrap_err(),
            "A shipped order cannot be marked cancelled"
        );
        assert!(check_transition(OrderStatus::Delivered, "pending").is_err());
        assert!(check_transition(OrderStatus::Pending, "lost").is_err());
    }

    #[test]
    fn test_filter_ignores_unknown_status() {
        let filter = OrderFilter {
            status: Some("refunded".to_string()),
        };
        assert_eq!(filter.status(), None);
        let filter = OrderFilter {
            status: Some("shipped".to_string()),
        };
        assert_eq!(filter.status(), Some(OrderStatus::Shipped));
    }

    #[test]
    fn test_status_tabs_mark_selection() {
        let tabs = status_tabs(&[], Some(OrderStatus::Pending));
        assert_eq!(tabs.len(), 6);
        assert!(!tabs[0].active);
        assert!(tabs[1].active);
        assert_eq!(tabs[1].value, "pending");
    }
}
