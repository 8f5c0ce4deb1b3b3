//! Dashboard and analytics pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use drape_core::order::Order;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;

use super::views::{OrderRowView, money, or_toast, status_class};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::CurrentAdmin;
use crate::services::PageContext;
use crate::services::analytics::{Analytics, DailyRevenue, LowStock, TopProduct};
use crate::state::AppState;

/// Orders shown on the dashboard.
const RECENT_ORDERS: usize = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/analytics", get(analytics))
}

/// Headline figures.
#[derive(Debug, Clone)]
pub struct StatsView {
    pub revenue: String,
    pub order_count: usize,
    pub average_order_value: String,
    pub pending_count: usize,
    pub product_count: usize,
    pub low_stock_count: usize,
}

impl From<&Analytics> for StatsView {
    fn from(a: &Analytics) -> Self {
        Self {
            revenue: money(a.revenue),
            order_count: a.order_count,
            average_order_value: money(a.average_order_value),
            pending_count: a.pending_count(),
            product_count: a.product_count,
            low_stock_count: a.low_stock.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LowStockView {
    pub product_id: String,
    pub name: String,
    pub size: String,
    pub stock: u32,
    pub out_of_stock: bool,
}

impl From<&LowStock> for LowStockView {
    fn from(l: &LowStock) -> Self {
        Self {
            product_id: l.product_id.to_string(),
            name: l.name.clone(),
            size: l.size.clone(),
            stock: l.stock,
            out_of_stock: l.stock == 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DailyRevenueView {
    pub label: String,
    pub revenue: String,
    pub orders: usize,
    /// Bar length relative to the best day, 0 to 100.
    pub bar_percent: u32,
}

#[derive(Debug, Clone)]
pub struct StatusCountView {
    pub label: &'static str,
    pub class: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct TopProductView {
    pub product_id: String,
    pub name: String,
    pub units: u32,
    pub revenue: String,
}

impl From<&TopProduct> for TopProductView {
    fn from(t: &TopProduct) -> Self {
        Self {
            product_id: t.product_id.to_string(),
            name: t.name.clone(),
            units: t.units,
            revenue: money(t.revenue),
        }
    }
}

fn daily_views(days: &[DailyRevenue]) -> Vec<DailyRevenueView> {
    let best = days.iter().map(|d| d.revenue).max().unwrap_or(Decimal::ZERO);
    days.iter()
        .map(|d| DailyRevenueView {
            label: d.date.format("%a %d %b").to_string(),
            revenue: money(d.revenue),
            orders: d.orders,
            bar_percent: if best.is_zero() {
                0
            } else {
                (d.revenue / best * Decimal::ONE_HUNDRED)
                    .round()
                    .to_u32()
                    .unwrap_or(0)
            },
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    page: PageContext,
    stats: StatsView,
    recent_orders: Vec<OrderRowView>,
    low_stock: Vec<LowStockView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "analytics.html")]
struct AnalyticsTemplate {
    page: PageContext,
    stats: StatsView,
    daily: Vec<DailyRevenueView>,
    statuses: Vec<StatusCountView>,
    top_products: Vec<TopProductView>,
    low_stock: Vec<LowStockView>,
}

/// Fetch orders and products together and compute the figures.
async fn load_analytics(
    state: &AppState,
    admin: &CurrentAdmin,
    page: &mut PageContext,
) -> Result<(Analytics, Vec<Order>)> {
    let backend = state.backend();
    let (orders, products) = tokio::join!(
        backend.list_orders(&admin.token),
        backend.list_products(&admin.token)
    );
    let orders = or_toast(page, orders)?;
    let products = or_toast(page, products)?;

    let today = chrono::Utc::now().date_naive();
    let analytics = Analytics::compute(
        &orders,
        &products,
        today,
        state.config().low_stock_threshold,
    );
    Ok((analytics, orders))
}

/// GET /
#[instrument(skip_all)]
async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
) -> Result<DashboardTemplate> {
    let (analytics, orders) = load_analytics(&state, &admin, &mut page).await?;

    Ok(DashboardTemplate {
        stats: StatsView::from(&analytics),
        recent_orders: orders.iter().take(RECENT_ORDERS).map(OrderRowView::from).collect(),
        low_stock: analytics.low_stock.iter().map(LowStockView::from).collect(),
        page,
    })
}

/// GET /analytics
#[instrument(skip_all)]
async fn analytics(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
) -> Result<AnalyticsTemplate> {
    let (analytics, _) = load_analytics(&state, &admin, &mut page).await?;

    Ok(AnalyticsTemplate {
        stats: StatsView::from(&analytics),
        daily: daily_views(&analytics.daily_revenue),
        statuses: analytics
            .status_counts
            .iter()
            .map(|(status, count)| StatusCountView {
                label: status.label(),
                class: status_class(*status),
                count: *count,
            })
            .collect(),
        top_products: analytics.top_products.iter().map(TopProductView::from).collect(),
        low_stock: analytics.low_stock.iter().map(LowStockView::from).collect(),
        page,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_daily_bars_scale_to_best_day() {
        let day = |d: u32, revenue: i64| DailyRevenue {
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            revenue: Decimal::from(revenue),
            orders: 1,
        };
        let views = daily_views(&[day(1, 50), day(2, 200), day(3, 0)]);
        assert_eq!(views[0].bar_percent, 25);
        assert_eq!(views[1].bar_percent, 100);
        assert_eq!(views[2].bar_percent, 0);
        assert_eq!(views[1].label, "Mon 02 Mar");

        assert!(daily_views(&[day(4, 0)]).iter().all(|v| v.bar_percent == 0));
    }
}
