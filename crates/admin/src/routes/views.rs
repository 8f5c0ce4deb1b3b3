//! View helpers shared by the admin pages.

use drape_core::Price;
use drape_core::order::{Order, OrderStatus};
use rust_decimal::Decimal;

use crate::backend::BackendError;
use crate::error::{Result, toast_for};
use crate::services::PageContext;

#[must_use]
pub fn money(amount: Decimal) -> String {
    Price::of(amount).display()
}

#[must_use]
pub fn status_class(status: OrderStatus) -> String {
    format!("status--{}", status.as_str())
}

/// Unwrap a backend result for a page that can still render without it.
///
/// Failures become a toast on `page` and the default value is used. A `401`
/// is not recoverable and is returned as an error.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` when the backend rejected the token.
pub fn or_toast<T: Default>(
    page: &mut PageContext,
    result: std::result::Result<T, BackendError>,
) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            page.toast(toast_for(e)?);
            Ok(T::default())
        }
    }
}

/// One row of an order table.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub customer: String,
    pub placed_on: String,
    pub item_count: u32,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.short_id(),
            customer: customer_name(order),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            item_count: order.item_count(),
            total: money(order.total),
            status_label: order.status.label(),
            status_class: status_class(order.status),
        }
    }
}

/// Account name if the backend expanded it, else the name on the address.
#[must_use]
pub fn customer_name(order: &Order) -> String {
    order
        .user
        .as_ref()
        .map(|u| u.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| order.shipping_address.full_name.trim())
        .to_string()
}
