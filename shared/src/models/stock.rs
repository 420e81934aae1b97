//! Stock pool and stock item models
//!
//! A stock pool owns the serialized inventory (PIN or eSIM codes) for
//! one product. Quantities on the pool are cached views over the item
//! list and are recomputed after every mutation rather than adjusted
//! incrementally, so they can never drift from the items themselves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::StockType;

/// Pool lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Active,
    Inactive,
    Depleted,
}

impl PoolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStatus::Active => "active",
            PoolStatus::Inactive => "inactive",
            PoolStatus::Depleted => "depleted",
        }
    }
}

/// Per-item lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockItemStatus {
    Available,
    Assigned,
    Used,
}

impl StockItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockItemStatus::Available => "available",
            StockItemStatus::Assigned => "assigned",
            StockItemStatus::Used => "used",
        }
    }
}

/// A single serialized inventory unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    /// Encrypted PIN number or ICCID
    pub payload: String,
    pub serial_number: Option<String>,
    pub activation_url: Option<String>,
    pub qr_code_url: Option<String>,
    pub qr_code_image: Option<String>,
    pub notes: Option<String>,
    pub face_value: Option<Decimal>,
    pub status: StockItemStatus,
    pub assigned_order_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    pub assigned_user_email: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StockItem {
    pub fn new(payload: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            serial_number: None,
            activation_url: None,
            qr_code_url: None,
            qr_code_image: None,
            notes: None,
            face_value: None,
            status: StockItemStatus::Available,
            assigned_order_id: None,
            assigned_user_id: None,
            assigned_user_email: None,
            assigned_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the item as handed out to a purchase
    pub fn assign(&mut self, order_id: Uuid, user_id: Option<Uuid>, user_email: Option<String>) {
        self.status = StockItemStatus::Assigned;
        self.assigned_order_id = Some(order_id);
        self.assigned_user_id = user_id;
        self.assigned_user_email = user_email;
        self.assigned_at = Some(Utc::now());
    }

    /// Return the item to the available pool, clearing assignment metadata
    pub fn release(&mut self) {
        self.status = StockItemStatus::Available;
        self.assigned_order_id = None;
        self.assigned_user_id = None;
        self.assigned_user_email = None;
        self.assigned_at = None;
    }

    /// True once the item has been handed out or redeemed
    pub fn is_consumed(&self) -> bool {
        matches!(self.status, StockItemStatus::Assigned | StockItemStatus::Used)
    }

    /// Masked reference for display; never exposes the payload. The
    /// serial tail is cut on char boundaries, not bytes; serials come
    /// from arbitrary CSV uploads.
    pub fn reference(&self) -> String {
        match &self.serial_number {
            Some(serial) => match serial.char_indices().rev().nth(3) {
                Some((cut, _)) => format!("{}(..{})", self.id, &serial[cut..]),
                None => format!("{}(..{})", self.id, serial),
            },
            None => self.id.to_string(),
        }
    }
}

/// A named, typed pool of serialized inventory for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPool {
    pub id: Uuid,
    /// Product the pool serves. A pool may exist without a matching
    /// catalog product, so this is a plain key, not a foreign id.
    pub product_key: String,
    pub stock_type: StockType,
    pub status: PoolStatus,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub assigned_quantity: u32,
    pub used_quantity: u32,
    pub items: Vec<StockItem>,
    /// Optimistic-concurrency version, bumped by the repository on save
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl StockPool {
    pub fn new(product_key: impl Into<String>, stock_type: StockType, created_by: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product_key: product_key.into(),
            stock_type,
            status: PoolStatus::Active,
            total_quantity: 0,
            available_quantity: 0,
            assigned_quantity: 0,
            used_quantity: 0,
            items: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            created_by,
        }
    }

    /// Recompute the cached quantity fields from the authoritative item
    /// list, and apply the depletion policy: an Active pool with stock
    /// and nothing left available becomes Depleted; a Depleted pool
    /// with stock available again becomes Active. Inactive pools are
    /// left alone.
    pub fn recompute_quantities(&mut self) {
        let mut available = 0u32;
        let mut assigned = 0u32;
        let mut used = 0u32;
        for item in &self.items {
            match item.status {
                StockItemStatus::Available => available += 1,
                StockItemStatus::Assigned => assigned += 1,
                StockItemStatus::Used => used += 1,
            }
        }
        self.available_quantity = available;
        self.assigned_quantity = assigned;
        self.used_quantity = used;
        self.total_quantity = self.items.len() as u32;

        match self.status {
            PoolStatus::Active if available == 0 && self.total_quantity > 0 => {
                self.status = PoolStatus::Depleted;
            }
            PoolStatus::Depleted if available > 0 => {
                self.status = PoolStatus::Active;
            }
            _ => {}
        }
        self.updated_at = Utc::now();
    }

    /// First item still available, in insertion order
    pub fn first_available_mut(&mut self) -> Option<&mut StockItem> {
        self.items
            .iter_mut()
            .find(|item| item.status == StockItemStatus::Available)
    }

    pub fn item(&self, item_id: Uuid) -> Option<&StockItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut StockItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    /// True when any item has been assigned or redeemed
    pub fn has_consumed_items(&self) -> bool {
        self.items.iter().any(StockItem::is_consumed)
    }
}

/// An unvalidated stock row parsed from a CSV upload, before it becomes
/// a persisted `StockItem`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockItemRecord {
    /// Plaintext PIN number or ICCID
    pub payload: String,
    pub serial_number: Option<String>,
    pub product_key: Option<String>,
    pub notes: Option<String>,
    pub face_value: Option<Decimal>,
    pub stock_type: Option<StockType>,
    pub activation_url: Option<String>,
    pub qr_code_url: Option<String>,
    pub qr_code_image: Option<String>,
}
