//! Order records and the order-history timeline projection.
//!
//! Orders are owned by the backend and never mutated here. The projection
//! sorts them newest first (the backend's order is not trusted) and maps each
//! status onto a fixed three-stage progress sequence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, OrderStatus, Price, TransactionId};

/// A line of a placed order, as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Delivery contact attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub name: String,
    pub phone: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub merchant_transaction_id: TransactionId,
    /// Total in minor currency units (paise).
    pub total_amount: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub delivery_info: Option<DeliveryInfo>,
}

impl OrderRecord {
    /// The order total as a displayable price.
    #[must_use]
    pub fn total(&self) -> Price {
        Price::from_minor_units(self.total_amount, CurrencyCode::INR)
    }
}

/// Progress stages shown on the order timeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStage {
    Confirmed,
    Preparing,
    Shipped,
}

impl OrderStage {
    /// All stages in timeline order.
    pub const ALL: [Self; 3] = [Self::Confirmed, Self::Preparing, Self::Shipped];

    /// The stage a status corresponds to, if it is a timeline status.
    #[must_use]
    pub const fn for_status(status: &OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Confirmed => Some(Self::Confirmed),
            OrderStatus::Preparing => Some(Self::Preparing),
            OrderStatus::Shipped => Some(Self::Shipped),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Preparing => "Preparing",
            Self::Shipped => "Shipped",
        }
    }
}

/// Position of `status` in the stage sequence.
///
/// Statuses outside the sequence (raw payment statuses, unknown values) are
/// "before stage 0" and yield `None`.
#[must_use]
pub fn stage_position(status: &OrderStatus) -> Option<usize> {
    let stage = OrderStage::for_status(status)?;
    OrderStage::ALL.iter().position(|s| *s == stage)
}

/// Sort orders by creation time, newest first.
pub fn sort_newest_first(orders: &mut [OrderRecord]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// One step of an order's progress display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub stage: OrderStage,
    pub label: &'static str,
    pub reached: bool,
}

/// An order projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTimeline {
    pub merchant_transaction_id: TransactionId,
    pub status: OrderStatus,
    pub total: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub delivery_info: Option<DeliveryInfo>,
    /// Index of the current stage, or `None` if no stage has been reached.
    pub position: Option<usize>,
    pub steps: Vec<TimelineStep>,
}

impl From<OrderRecord> for OrderTimeline {
    fn from(order: OrderRecord) -> Self {
        let position = stage_position(&order.status);
        let steps = OrderStage::ALL
            .iter()
            .enumerate()
            .map(|(i, stage)| TimelineStep {
                stage: *stage,
                label: stage.label(),
                reached: position.is_some_and(|p| i <= p),
            })
            .collect();

        Self {
            total: order.total().display(),
            merchant_transaction_id: order.merchant_transaction_id,
            status: order.status,
            created_at: order.created_at,
            items: order.items,
            delivery_info: order.delivery_info,
            position,
            steps,
        }
    }
}

/// Project a backend order list into newest-first timelines.
#[must_use]
pub fn project_history(mut orders: Vec<OrderRecord>) -> Vec<OrderTimeline> {
    sort_newest_first(&mut orders);
    orders.into_iter().map(OrderTimeline::from).collect()
}
