//! In-memory repository adapters
//!
//! Back the test suite and the development binary. Each adapter is a
//! `HashMap` behind an async `RwLock`; `save` enforces the same
//! version compare-and-swap contract a document-store adapter would,
//! so a lost update surfaces as `Conflict` instead of silent
//! overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    LimitStatus, PoolStatus, Product, RetailerAccount, RetailerLimit, RetailerOrder, StockPool,
    StockType,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{
    CatalogRepository, OrderRepository, RetailerLimitRepository, RetailerRepository,
    StockPoolRepository,
};

/// In-memory stock pool store
#[derive(Clone, Default)]
pub struct InMemoryStockPoolRepository {
    pools: Arc<RwLock<HashMap<Uuid, StockPool>>>,
}

impl InMemoryStockPoolRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockPoolRepository for InMemoryStockPoolRepository {
    async fn find_by_product_and_type(
        &self,
        product_key: &str,
        stock_type: StockType,
    ) -> AppResult<Option<StockPool>> {
        let pools = self.pools.read().await;
        Ok(pools
            .values()
            .find(|p| p.product_key == product_key && p.stock_type == stock_type)
            .cloned())
    }

    async fn find_by_id(&self, pool_id: Uuid) -> AppResult<Option<StockPool>> {
        Ok(self.pools.read().await.get(&pool_id).cloned())
    }

    async fn save(&self, mut pool: StockPool) -> AppResult<StockPool> {
        let mut pools = self.pools.write().await;
        if let Some(existing) = pools.get(&pool.id) {
            if existing.version != pool.version {
                return Err(AppError::Conflict("stock pool".to_string()));
            }
        }
        pool.version += 1;
        pools.insert(pool.id, pool.clone());
        Ok(pool)
    }

    async fn delete_by_id(&self, pool_id: Uuid) -> AppResult<()> {
        let mut pools = self.pools.write().await;
        if pools.remove(&pool_id).is_none() {
            return Err(AppError::NotFound("Stock pool".to_string()));
        }
        Ok(())
    }

    async fn find_by_status(&self, status: PoolStatus) -> AppResult<Vec<StockPool>> {
        let pools = self.pools.read().await;
        Ok(pools.values().filter(|p| p.status == status).cloned().collect())
    }

    async fn find_low_stock(&self, threshold: u32) -> AppResult<Vec<StockPool>> {
        let pools = self.pools.read().await;
        Ok(pools
            .values()
            .filter(|p| p.available_quantity <= threshold)
            .cloned()
            .collect())
    }
}

/// In-memory credit ledger store
#[derive(Clone, Default)]
pub struct InMemoryRetailerLimitRepository {
    limits: Arc<RwLock<HashMap<Uuid, RetailerLimit>>>,
}

impl InMemoryRetailerLimitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetailerLimitRepository for InMemoryRetailerLimitRepository {
    async fn find_by_retailer_id(&self, retailer_id: Uuid) -> AppResult<Option<RetailerLimit>> {
        let limits = self.limits.read().await;
        Ok(limits.values().find(|l| l.retailer_id == retailer_id).cloned())
    }

    async fn exists_by_retailer_id(&self, retailer_id: Uuid) -> AppResult<bool> {
        let limits = self.limits.read().await;
        Ok(limits.values().any(|l| l.retailer_id == retailer_id))
    }

    async fn save(&self, mut limit: RetailerLimit) -> AppResult<RetailerLimit> {
        let mut limits = self.limits.write().await;
        if let Some(existing) = limits.get(&limit.id) {
            if existing.version != limit.version {
                return Err(AppError::Conflict("retailer limit".to_string()));
            }
        } else if limits.values().any(|l| l.retailer_id == limit.retailer_id) {
            // One ledger per retailer, enforced at the store as well
            return Err(AppError::AlreadyExists);
        }
        limit.version += 1;
        limits.insert(limit.id, limit.clone());
        Ok(limit)
    }

    async fn find_by_status(&self, status: LimitStatus) -> AppResult<Vec<RetailerLimit>> {
        let limits = self.limits.read().await;
        Ok(limits.values().filter(|l| l.status == status).cloned().collect())
    }

    async fn find_overdue(&self, today: NaiveDate) -> AppResult<Vec<RetailerLimit>> {
        let limits = self.limits.read().await;
        Ok(limits.values().filter(|l| l.is_overdue(today)).cloned().collect())
    }
}

/// In-memory order store
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<Uuid, RetailerOrder>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn exists_by_order_number(&self, order_number: &str) -> AppResult<bool> {
        let orders = self.orders.read().await;
        Ok(orders.values().any(|o| o.order_number == order_number))
    }

    async fn save(&self, order: RetailerOrder) -> AppResult<RetailerOrder> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, order_id: Uuid) -> AppResult<Option<RetailerOrder>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }
}

/// In-memory catalog store
#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_by_key(&self, product_key: &str) -> AppResult<Option<Product>> {
        Ok(self.products.read().await.get(product_key).cloned())
    }

    async fn save(&self, mut product: Product) -> AppResult<Product> {
        let mut products = self.products.write().await;
        if let Some(existing) = products.get(&product.product_key) {
            if existing.version != product.version {
                return Err(AppError::Conflict("product".to_string()));
            }
        }
        product.version += 1;
        products.insert(product.product_key.clone(), product.clone());
        Ok(product)
    }
}

/// In-memory retailer account store
#[derive(Clone, Default)]
pub struct InMemoryRetailerRepository {
    accounts: Arc<RwLock<HashMap<Uuid, RetailerAccount>>>,
}

impl InMemoryRetailerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetailerRepository for InMemoryRetailerRepository {
    async fn find_by_id(&self, retailer_id: Uuid) -> AppResult<Option<RetailerAccount>> {
        Ok(self.accounts.read().await.get(&retailer_id).cloned())
    }

    async fn save(&self, account: RetailerAccount) -> AppResult<RetailerAccount> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account.clone());
        Ok(account)
    }
}
