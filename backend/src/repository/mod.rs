//! Repository ports for the core aggregates
//!
//! One trait per aggregate root. `save` is an upsert with an
//! optimistic-concurrency check: the aggregate's `version` must match
//! the stored one, and the stored copy (with the bumped version) is
//! returned. Adapters for real document stores implement the same
//! contract; the in-memory adapters in [`memory`] back the tests and
//! the development binary.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    LimitStatus, PoolStatus, Product, RetailerAccount, RetailerLimit, RetailerOrder, StockPool,
    StockType,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::AppResult;

/// Persistence for stock pools
#[async_trait]
pub trait StockPoolRepository: Send + Sync {
    async fn find_by_product_and_type(
        &self,
        product_key: &str,
        stock_type: StockType,
    ) -> AppResult<Option<StockPool>>;

    async fn find_by_id(&self, pool_id: Uuid) -> AppResult<Option<StockPool>>;

    /// Upsert with recomputed quantities; fails `Conflict` on a stale version
    async fn save(&self, pool: StockPool) -> AppResult<StockPool>;

    async fn delete_by_id(&self, pool_id: Uuid) -> AppResult<()>;

    async fn find_by_status(&self, status: PoolStatus) -> AppResult<Vec<StockPool>>;

    /// Pools whose available quantity is at or below `threshold`
    async fn find_low_stock(&self, threshold: u32) -> AppResult<Vec<StockPool>>;
}

/// Persistence for retailer credit ledgers
#[async_trait]
pub trait RetailerLimitRepository: Send + Sync {
    async fn find_by_retailer_id(&self, retailer_id: Uuid) -> AppResult<Option<RetailerLimit>>;

    async fn exists_by_retailer_id(&self, retailer_id: Uuid) -> AppResult<bool>;

    async fn save(&self, limit: RetailerLimit) -> AppResult<RetailerLimit>;

    async fn find_by_status(&self, status: LimitStatus) -> AppResult<Vec<RetailerLimit>>;

    /// Ledgers with outstanding debt past their due date
    async fn find_overdue(&self, today: NaiveDate) -> AppResult<Vec<RetailerLimit>>;
}

/// Persistence for purchase orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn exists_by_order_number(&self, order_number: &str) -> AppResult<bool>;

    async fn save(&self, order: RetailerOrder) -> AppResult<RetailerOrder>;

    async fn find_by_id(&self, order_id: Uuid) -> AppResult<Option<RetailerOrder>>;
}

/// Read/write access to the slice of the catalog the order flow needs
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_by_key(&self, product_key: &str) -> AppResult<Option<Product>>;

    async fn save(&self, product: Product) -> AppResult<Product>;
}

/// Lookup of retailer accounts (owned by the user-management side)
#[async_trait]
pub trait RetailerRepository: Send + Sync {
    async fn find_by_id(&self, retailer_id: Uuid) -> AppResult<Option<RetailerAccount>>;

    async fn save(&self, account: RetailerAccount) -> AppResult<RetailerAccount>;
}

/// Per-key async mutex used to serialize read-modify-write spans on a
/// single aggregate (one logical lock per pool, one per retailer).
/// Reads stay concurrent; writers to the same key queue up.
#[derive(Default)]
pub struct KeyedMutex {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, creating it on first use
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}
