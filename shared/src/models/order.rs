//! Retailer order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// One purchased product line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_key: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub retail_price: Option<Decimal>,
}

/// Purchase record produced by the order flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerOrder {
    pub id: Uuid,
    pub order_number: String,
    pub retailer_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    /// Ordered ids of the stock items handed out for this order.
    /// A lookup-only reference for display; the pool owns the items.
    pub allocated_item_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RetailerOrder {
    pub fn new(
        order_number: String,
        retailer_id: Uuid,
        lines: Vec<OrderLine>,
        total_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number,
            retailer_id,
            lines,
            total_amount,
            status: OrderStatus::Pending,
            allocated_item_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
