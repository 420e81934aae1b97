//! Stock pool service for serialized PIN/eSIM inventory
//!
//! Each pool hands out single-use codes; an item may be allocated to
//! at most one order. Every mutating operation on a pool runs under
//! that pool's lock, so two concurrent purchases can never walk away
//! with the same item, and quantities are recomputed from the item
//! list before every save.

use std::sync::Arc;

use shared::{PoolStatus, StockItem, StockItemStatus, StockPool, StockType};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{KeyedMutex, StockPoolRepository};

/// Stock pool engine
#[derive(Clone)]
pub struct StockPoolService {
    pools: Arc<dyn StockPoolRepository>,
    locks: Arc<KeyedMutex>,
}

fn pool_key(product_key: &str, stock_type: StockType) -> String {
    format!("pool:{}:{}", product_key, stock_type.as_str())
}

impl StockPoolService {
    pub fn new(pools: Arc<dyn StockPoolRepository>) -> Self {
        Self {
            pools,
            locks: Arc::new(KeyedMutex::new()),
        }
    }

    /// Look up the pool for (product, stock type), creating an empty
    /// Active pool when none exists. Pool existence is independent of
    /// the catalog: a missing catalog product is never an error here.
    pub async fn get_or_create_pool(
        &self,
        product_key: &str,
        stock_type: StockType,
        actor: Option<Uuid>,
    ) -> AppResult<StockPool> {
        let _guard = self.locks.lock(&pool_key(product_key, stock_type)).await;
        self.get_or_create_locked(product_key, stock_type, actor).await
    }

    async fn get_or_create_locked(
        &self,
        product_key: &str,
        stock_type: StockType,
        actor: Option<Uuid>,
    ) -> AppResult<StockPool> {
        if let Some(pool) = self
            .pools
            .find_by_product_and_type(product_key, stock_type)
            .await?
        {
            return Ok(pool);
        }

        let pool = StockPool::new(product_key, stock_type, actor);
        let pool = self.pools.save(pool).await?;
        tracing::info!(
            product_key,
            stock_type = stock_type.as_str(),
            pool_id = %pool.id,
            "created stock pool"
        );
        Ok(pool)
    }

    /// Append new items to the pool for (product, stock type), creating
    /// the pool if needed. Items are append-only; re-imports simply add
    /// more items and quantities are recomputed from the full list.
    pub async fn add_items(
        &self,
        product_key: &str,
        stock_type: StockType,
        items: Vec<StockItem>,
        actor: Option<Uuid>,
    ) -> AppResult<StockPool> {
        if items.is_empty() {
            return Err(AppError::validation("items", "no items to add"));
        }

        let _guard = self.locks.lock(&pool_key(product_key, stock_type)).await;
        let mut pool = self.get_or_create_locked(product_key, stock_type, actor).await?;
        let added = items.len();
        pool.items.extend(items);
        pool.recompute_quantities();
        let pool = self.pools.save(pool).await?;
        tracing::info!(
            pool_id = %pool.id,
            added,
            available = pool.available_quantity,
            "stock items added"
        );
        Ok(pool)
    }

    /// Hand out the first available item in insertion order, marking it
    /// assigned to the given order. Fails `NoStockAvailable` when no
    /// pool exists or nothing is left.
    pub async fn allocate(
        &self,
        product_key: &str,
        stock_type: StockType,
        order_id: Uuid,
        user_id: Option<Uuid>,
        user_email: Option<String>,
    ) -> AppResult<StockItem> {
        let _guard = self.locks.lock(&pool_key(product_key, stock_type)).await;

        let mut pool = self
            .pools
            .find_by_product_and_type(product_key, stock_type)
            .await?
            .ok_or_else(|| AppError::NoStockAvailable {
                product_key: product_key.to_string(),
            })?;

        if pool.status == PoolStatus::Inactive {
            return Err(AppError::NoStockAvailable {
                product_key: product_key.to_string(),
            });
        }

        let item = match pool.first_available_mut() {
            Some(item) => {
                item.assign(order_id, user_id, user_email);
                item.clone()
            }
            None => {
                return Err(AppError::NoStockAvailable {
                    product_key: product_key.to_string(),
                })
            }
        };

        pool.recompute_quantities();
        self.pools.save(pool).await?;
        tracing::debug!(item_id = %item.id, order_id = %order_id, "stock item allocated");
        Ok(item)
    }

    /// Return an assigned item to the pool (compensation path when a
    /// purchase cannot complete). Releasing an already-available item
    /// is a no-op so retried rollbacks stay safe.
    pub async fn release(
        &self,
        product_key: &str,
        stock_type: StockType,
        item_id: Uuid,
    ) -> AppResult<()> {
        let _guard = self.locks.lock(&pool_key(product_key, stock_type)).await;

        let mut pool = self
            .pools
            .find_by_product_and_type(product_key, stock_type)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;

        let item = pool
            .item_mut(item_id)
            .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        match item.status {
            StockItemStatus::Available => return Ok(()),
            StockItemStatus::Assigned => item.release(),
            StockItemStatus::Used => {
                return Err(AppError::validation("item", "used items cannot be released"))
            }
        }

        pool.recompute_quantities();
        self.pools.save(pool).await?;
        tracing::debug!(item_id = %item_id, "stock item released");
        Ok(())
    }

    /// Transition an item's status (e.g. Assigned -> Used on
    /// redemption) and recompute the pool quantities.
    pub async fn update_item_status(
        &self,
        pool_id: Uuid,
        item_id: Uuid,
        new_status: StockItemStatus,
    ) -> AppResult<StockPool> {
        // Resolve the pool first so the right per-pool lock is taken
        let pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;
        let key = pool_key(&pool.product_key, pool.stock_type);

        let _guard = self.locks.lock(&key).await;
        let mut pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;

        let item = pool
            .item_mut(item_id)
            .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        if new_status == StockItemStatus::Available {
            item.release();
        } else {
            item.status = new_status;
        }

        pool.recompute_quantities();
        Ok(self.pools.save(pool).await?)
    }

    /// Manually activate or deactivate a pool. An Inactive pool keeps
    /// its items but refuses allocations until reactivated.
    pub async fn set_pool_status(&self, pool_id: Uuid, status: PoolStatus) -> AppResult<StockPool> {
        let pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;
        let key = pool_key(&pool.product_key, pool.stock_type);

        let _guard = self.locks.lock(&key).await;
        let mut pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;

        pool.status = status;
        pool.recompute_quantities();
        Ok(self.pools.save(pool).await?)
    }

    /// Remove a single item; refused while the item is assigned or used
    pub async fn delete_item(&self, pool_id: Uuid, item_id: Uuid) -> AppResult<StockPool> {
        let pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;
        let key = pool_key(&pool.product_key, pool.stock_type);

        let _guard = self.locks.lock(&key).await;
        let mut pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;

        let item = pool
            .item(item_id)
            .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;
        if item.is_consumed() {
            return Err(AppError::ItemInUse);
        }

        pool.items.retain(|i| i.id != item_id);
        pool.recompute_quantities();
        Ok(self.pools.save(pool).await?)
    }

    /// Hard-delete a pool; refused while any item is assigned or used
    pub async fn delete_pool(&self, pool_id: Uuid) -> AppResult<()> {
        let pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;
        let key = pool_key(&pool.product_key, pool.stock_type);

        let _guard = self.locks.lock(&key).await;
        let pool = self
            .pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))?;

        if pool.has_consumed_items() {
            return Err(AppError::PoolInUse);
        }

        self.pools.delete_by_id(pool_id).await?;
        tracing::info!(pool_id = %pool_id, "stock pool deleted");
        Ok(())
    }

    pub async fn get_pool(&self, pool_id: Uuid) -> AppResult<StockPool> {
        self.pools
            .find_by_id(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock pool".to_string()))
    }

    pub async fn find_pool(
        &self,
        product_key: &str,
        stock_type: StockType,
    ) -> AppResult<Option<StockPool>> {
        self.pools.find_by_product_and_type(product_key, stock_type).await
    }

    /// Pools at or below an availability threshold, for ops dashboards
    pub async fn find_low_stock(&self, threshold: u32) -> AppResult<Vec<StockPool>> {
        self.pools.find_low_stock(threshold).await
    }
}
