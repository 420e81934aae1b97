//! Catalog product model
//!
//! Only the slice of the catalog the order flow needs: the active
//! flag, pricing, and the coarse stock/sold counters checked before
//! any per-item pool allocation happens.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub product_key: String,
    pub name: String,
    pub active: bool,
    pub unit_price: Decimal,
    pub retail_price: Option<Decimal>,
    /// Coarse catalog stock counter, independent of the pool's
    /// per-item availability
    pub stock_count: i64,
    pub sold_count: i64,
    /// Optimistic-concurrency version, bumped by the repository on save
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(product_key: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product_key: product_key.into(),
            name: name.into(),
            active: true,
            unit_price,
            retail_price: None,
            stock_count: 0,
            sold_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
