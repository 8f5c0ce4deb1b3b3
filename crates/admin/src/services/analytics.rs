//! Store analytics computed from the backend's order and product lists.
//!
//! Cancelled orders count towards the order total and the status breakdown,
//! but never towards revenue, average order value, daily revenue or top
//! sellers.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use drape_core::ProductId;
use drape_core::order::{Order, OrderStatus};
use drape_core::product::Product;
use rust_decimal::Decimal;

/// Days covered by the revenue trend, today included.
pub const TREND_DAYS: u64 = 7;

/// How many best sellers to list.
pub const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub units: u32,
    pub revenue: Decimal,
}

/// A product size at or below the low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStock {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    pub revenue: Decimal,
    pub order_count: usize,
    pub average_order_value: Decimal,
    pub status_counts: Vec<(OrderStatus, usize)>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<LowStock>,
    pub product_count: usize,
}

impl Analytics {
    /// Compute every figure in one pass over the inputs.
    #[must_use]
    pub fn compute(
        orders: &[Order],
        products: &[Product],
        today: NaiveDate,
        low_stock_threshold: u32,
    ) -> Self {
        let counted: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .collect();

        let revenue: Decimal = counted.iter().map(|o| o.total).sum();
        let average_order_value = match Decimal::from(counted.len()) {
            n if n.is_zero() => Decimal::ZERO,
            n => (revenue / n).round_dp(2),
        };

        let status_counts = OrderStatus::all()
            .into_iter()
            .map(|status| (status, orders.iter().filter(|o| o.status == status).count()))
            .collect();

        Self {
            revenue,
            order_count: orders.len(),
            average_order_value,
            status_counts,
            daily_revenue: daily_revenue(&counted, today),
            top_products: top_products(&counted),
            low_stock: low_stock(products, low_stock_threshold),
            product_count: products.len(),
        }
    }

    /// Orders still waiting for an admin to start processing them.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.status_counts
            .iter()
            .find(|(status, _)| *status == OrderStatus::Pending)
            .map_or(0, |(_, n)| *n)
    }
}

fn daily_revenue(orders: &[&Order], today: NaiveDate) -> Vec<DailyRevenue> {
    (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| {
            let on_day = orders.iter().filter(|o| o.created_at.date_naive() == date);
            DailyRevenue {
                date,
                revenue: on_day.clone().map(|o| o.total).sum(),
                orders: on_day.count(),
            }
        })
        .collect()
}

fn top_products(orders: &[&Order]) -> Vec<TopProduct> {
    let mut by_product: HashMap<&ProductId, TopProduct> = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let entry = by_product
            .entry(&item.product_id)
            .or_insert_with(|| TopProduct {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                units: 0,
                revenue: Decimal::ZERO,
            });
        entry.units += item.quantity;
        entry.revenue += item.line_total();
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_PRODUCTS);
    ranked
}

fn low_stock(products: &[Product], threshold: u32) -> Vec<LowStock> {
    let mut flagged: Vec<LowStock> = products
        .iter()
        .flat_map(|product| {
            product.sizes.iter().filter_map(move |size| {
                let stock = product.stock_for(size);
                (stock <= threshold).then(|| LowStock {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    size: size.clone(),
                    stock,
                })
            })
        })
        .collect();
    flagged.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    flagged
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use drape_core::OrderId;
    use drape_core::checkout::{PaymentMethod, ShippingAddress};
    use drape_core::order::OrderItem;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(product: &str, name: &str, quantity: u32, price: &str) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(product),
            name: name.to_string(),
            size: "M".to_string(),
            quantity,
            price: dec(price),
            accessories: Vec::new(),
            image: None,
        }
    }

    fn order(id: &str, day: u32, status: OrderStatus, items: Vec<OrderItem>) -> Order {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        Order {
            id: OrderId::new(id),
            user: None,
            items,
            shipping_address: ShippingAddress::default(),
            payment_method: PaymentMethod::Cod,
            subtotal,
            shipping_fee: Decimal::ZERO,
            total: subtotal,
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
        }
    }

    fn product(id: &str, name: &str, stock: &[(&str, u32)]) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::TEN,
            original_price: None,
            category: "Tops".to_string(),
            images: Vec::new(),
            sizes: stock.iter().map(|(s, _)| (*s).to_string()).collect(),
            stock: stock
                .iter()
                .map(|(s, n)| ((*s).to_string(), *n))
                .collect::<BTreeMap<_, _>>(),
            accessories: Vec::new(),
            featured: false,
            created_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn test_cancelled_orders_excluded_from_revenue() {
        let orders = vec![
            order("o1", 9, OrderStatus::Delivered, vec![item("p1", "Linen Shirt", 2, "40")]),
            order("o2", 10, OrderStatus::Pending, vec![item("p2", "Denim Jacket", 1, "60")]),
            order("o3", 10, OrderStatus::Cancelled, vec![item("p2", "Denim Jacket", 5, "60")]),
        ];

        let analytics = Analytics::compute(&orders, &[], today(), 5);
        assert_eq!(analytics.revenue, dec("140"));
        assert_eq!(analytics.order_count, 3);
        assert_eq!(analytics.average_order_value, dec("70"));
        assert_eq!(analytics.pending_count(), 1);
        assert!(
            analytics
                .status_counts
                .contains(&(OrderStatus::Cancelled, 1))
        );
    }

    #[test]
    fn test_daily_revenue_covers_last_seven_days() {
        let orders = vec![
            order("o1", 2, OrderStatus::Delivered, vec![item("p1", "Tee", 1, "15")]),
            order("o2", 4, OrderStatus::Shipped, vec![item("p1", "Tee", 2, "15")]),
            order("o3", 10, OrderStatus::Pending, vec![item("p1", "Tee", 1, "15")]),
        ];

        let daily = Analytics::compute(&orders, &[], today(), 5).daily_revenue;
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(daily[0].revenue, dec("30"));
        assert_eq!(daily[6].date, today());
        assert_eq!(daily[6].orders, 1);
        // The order on the 2nd is outside the window.
        let total: Decimal = daily.iter().map(|d| d.revenue).sum();
        assert_eq!(total, dec("45"));
    }

    #[test]
    fn test_top_products_ranked_by_units() {
        let orders = vec![
            order(
                "o1",
                8,
                OrderStatus::Delivered,
                vec![item("p1", "Tee", 1, "15"), item("p2", "Scarf", 4, "8")],
            ),
            order("o2", 9, OrderStatus::Processing, vec![item("p1", "Tee", 2, "15")]),
            order("o3", 9, OrderStatus::Cancelled, vec![item("p3", "Belt", 10, "5")]),
        ];

        let top = Analytics::compute(&orders, &[], today(), 5).top_products;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Scarf");
        assert_eq!(top[0].units, 4);
        assert_eq!(top[1].units, 3);
        assert_eq!(top[1].revenue, dec("45"));
    }

    #[test]
    fn test_low_stock_uses_threshold_inclusive() {
        let products = vec![
            product("p1", "Tee", &[("S", 5), ("M", 6), ("L", 0)]),
            product("p2", "Kurta", &[("M", 2)]),
        ];

        let low = Analytics::compute(&[], &products, today(), 5).low_stock;
        let labels: Vec<(String, u32)> = low
            .iter()
            .map(|l| (format!("{} {}", l.name, l.size), l.stock))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Tee L".to_string(), 0),
                ("Kurta M".to_string(), 2),
                ("Tee S".to_string(), 5),
            ]
        );
    }

    #[test]
    fn test_no_orders() {
        let analytics = Analytics::compute(&[], &[], today(), 5);
        assert_eq!(analytics.revenue, Decimal::ZERO);
        assert_eq!(analytics.average_order_value, Decimal::ZERO);
        assert!(analytics.top_products.is_empty());
    }
}
