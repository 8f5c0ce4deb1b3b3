//! Orders and their fulfilment status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checkout::{PaymentMethod, ShippingAddress};
use crate::product::Accessory;
use crate::types::{OrderId, ProductId};

/// Fulfilment status.
///
/// Orders move forward through pending, processing, shipped and delivered.
/// Pending and processing orders can also be cancelled. Delivered and
/// cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in display order.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Pending,
            Self::Processing,
            Self::Shipped,
            Self::Delivered,
            Self::Cancelled,
        ]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order placed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an admin may move an order from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }

    /// Statuses reachable in one step.
    #[must_use]
    pub fn next_statuses(self) -> Vec<Self> {
        Self::all()
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }

    const fn progress_rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// One step of the customer-facing timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub reached: bool,
    pub current: bool,
}

/// Timeline for an order in `status`.
///
/// Normal orders show the four forward steps with those up to `status`
/// marked reached. A cancelled order shows only the placed and cancelled steps.
#[must_use]
pub fn tracking_steps(status: OrderStatus) -> Vec<TrackingStep> {
    let Some(rank) = status.progress_rank() else {
        return vec![
            TrackingStep {
                status: OrderStatus::Pending,
                label: OrderStatus::Pending.label(),
                reached: true,
                current: false,
            },
            TrackingStep {
                status: OrderStatus::Cancelled,
                label: OrderStatus::Cancelled.label(),
                reached: true,
                current: true,
            },
        ];
    };

    [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ]
    .into_iter()
    .map(|step| {
        let step_rank = step.progress_rank().unwrap_or(0);
        TrackingStep {
            status: step,
            label: step.label(),
            reached: step_rank <= rank,
            current: step == status,
        }
    })
    .collect()
}

/// A purchased line as stored on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    /// Unit price of the garment, excluding accessories.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        let accessories: Decimal = self.accessories.iter().map(|a| a.price).sum();
        (self.price + accessories) * Decimal::from(self.quantity)
    }
}

/// The user an order belongs to, when the backend populates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderCustomer>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn timeline(&self) -> Vec<TrackingStep> {
        tracking_steps(self.status)
    }

    /// Last eight characters of the id, upper-cased, as shown to customers.
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(7)
            .map_or(0, |(i, _)| i);
        id.get(start..).unwrap_or(id).to_uppercase()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
        assert!(Cancelled.next_statuses().is_empty());
        assert_eq!(Processing.next_statuses(), vec![Shipped, Cancelled]);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::all() {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_tracking_steps_progress() {
        let steps = tracking_steps(OrderStatus::Shipped);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].reached && steps[1].reached && steps[2].reached);
        assert!(!steps[3].reached);
        assert!(steps[2].current);
    }

    #[test]
    fn test_tracking_steps_cancelled() {
        let steps = tracking_steps(OrderStatus::Cancelled);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].status, OrderStatus::Cancelled);
        assert!(steps[1].current);
    }

    #[test]
    fn test_order_deserializes() {
        let json = r#"{
            "_id": "65f0a1b2c3d4e5f6a7b8c9d0",
            "items": [{"product": "p1", "name": "Tee", "size": "M", "quantity": 2, "price": 20,
                       "accessories": [{"id": "belt", "name": "Belt", "price": 5}]}],
            "shippingAddress": {"fullName": "Asha", "email": "a@x.in", "phone": "9876543210",
                                "street": "1 MG Road", "city": "Pune", "state": "Maharashtra", "pincode": "411001"},
            "paymentMethod": "cod",
            "subtotal": 50, "shippingFee": 10, "total": 60,
            "status": "processing",
            "createdAt": "2024-05-01T08:30:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.items[0].line_total(), Decimal::from(50));
        assert_eq!(order.short_id(), "A7B8C9D0");
    }
}
