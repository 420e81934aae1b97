//! Point-of-sale purchase flow
//!
//! The one place where two aggregates move together: a purchase debits
//! the retailer's credit ledger and allocates serialized stock, then
//! records the order. There is no cross-aggregate transaction, so the
//! flow checks credit before touching stock and releases any partial
//! allocation when a later step fails; the ledger is only debited once
//! the full quantity is in hand.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{
    round_money, validate_email, validate_quantity, OrderLine, OrderStatus, Product, RetailerOrder,
    StockItem, StockType,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{CatalogRepository, OrderRepository};
use crate::services::{CreditLedgerService, StockPoolService};

/// A retailer purchase request
#[derive(Debug, Clone)]
pub struct PurchaseInput {
    pub retailer_id: Uuid,
    pub product_key: String,
    pub stock_type: StockType,
    pub quantity: u32,
    /// End-customer email recorded on the allocated items, if any
    pub customer_email: Option<String>,
}

/// Outcome of a completed purchase
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub order_id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    /// Masked references to the allocated items; payloads stay encrypted
    pub allocated_items: Vec<String>,
    pub remaining_credit: Decimal,
    pub utilization: Decimal,
}

/// Purchase orchestrator
#[derive(Clone)]
pub struct PurchaseService {
    ledger: CreditLedgerService,
    stock: StockPoolService,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

const ORDER_NUMBER_ATTEMPTS: usize = 10;
const CATALOG_COUNTER_ATTEMPTS: usize = 10;

impl PurchaseService {
    pub fn new(
        ledger: CreditLedgerService,
        stock: StockPoolService,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            ledger,
            stock,
            orders,
            catalog,
        }
    }

    /// Execute a purchase end to end: validate, allocate stock, debit
    /// the ledger, record the order. Either everything lands or the
    /// pool and ledger are left exactly as they were.
    pub async fn purchase(&self, input: PurchaseInput) -> AppResult<PurchaseReceipt> {
        validate_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;
        if let Some(email) = &input.customer_email {
            validate_email(email).map_err(|msg| AppError::validation("customer_email", msg))?;
        }

        let ledger = self.ledger.get(input.retailer_id).await?;
        if !ledger.is_active() {
            return Err(AppError::LedgerNotActive);
        }

        let product = self.product(&input.product_key).await?;
        if product.stock_count < i64::from(input.quantity) {
            return Err(AppError::InsufficientStock(format!(
                "catalog lists {} units of {}, {} requested",
                product.stock_count, product.product_key, input.quantity
            )));
        }

        let total_amount = round_money(product.unit_price * Decimal::from(input.quantity));

        // Credit check happens before any allocation so exhausted
        // credit never leaves items to roll back
        if !self
            .ledger
            .has_sufficient_credit(input.retailer_id, total_amount)
            .await?
        {
            return Err(AppError::InsufficientCredit {
                requested: total_amount,
                available: ledger.available_credit(),
            });
        }

        let order_id = Uuid::new_v4();
        let allocated = self.allocate_all(&input, order_id).await?;

        let debited = match self
            .ledger
            .use_credit(
                input.retailer_id,
                total_amount,
                Some(order_id),
                &format!("purchase {} x{}", input.product_key, input.quantity),
            )
            .await
        {
            Ok(ledger) => ledger,
            Err(err) => {
                // Lost the credit race after allocating; put the stock back
                self.release_all(&input, &allocated).await;
                return Err(err);
            }
        };

        let order_number = self.generate_order_number().await?;
        let mut order = RetailerOrder::new(
            order_number,
            input.retailer_id,
            vec![OrderLine {
                product_key: product.product_key.clone(),
                quantity: input.quantity,
                unit_price: product.unit_price,
                retail_price: product.retail_price,
            }],
            total_amount,
        );
        order.id = order_id;
        order.status = OrderStatus::Completed;
        order.allocated_item_ids = allocated.iter().map(|item| item.id).collect();
        let order = self.orders.save(order).await?;

        self.update_catalog_counters(&product.product_key, input.quantity)
            .await;

        tracing::info!(
            order_number = %order.order_number,
            retailer_id = %input.retailer_id,
            total = %total_amount,
            "purchase completed"
        );

        Ok(PurchaseReceipt {
            order_id: order.id,
            order_number: order.order_number,
            total_amount,
            allocated_items: allocated.iter().map(StockItem::reference).collect(),
            remaining_credit: debited.available_credit(),
            utilization: debited.utilization(),
        })
    }

    /// Allocate the full quantity one item at a time; on a partial run
    /// every already-allocated item is released and the purchase fails
    /// with `InsufficientStock`.
    async fn allocate_all(
        &self,
        input: &PurchaseInput,
        order_id: Uuid,
    ) -> AppResult<Vec<StockItem>> {
        let mut allocated: Vec<StockItem> = Vec::with_capacity(input.quantity as usize);
        for _ in 0..input.quantity {
            match self
                .stock
                .allocate(
                    &input.product_key,
                    input.stock_type,
                    order_id,
                    Some(input.retailer_id),
                    input.customer_email.clone(),
                )
                .await
            {
                Ok(item) => allocated.push(item),
                Err(AppError::NoStockAvailable { .. }) => {
                    let got = allocated.len();
                    self.release_all(input, &allocated).await;
                    return Err(AppError::InsufficientStock(format!(
                        "pool for {} ran out after {} of {} allocations",
                        input.product_key, got, input.quantity
                    )));
                }
                Err(err) => {
                    self.release_all(input, &allocated).await;
                    return Err(err);
                }
            }
        }
        Ok(allocated)
    }

    /// Compensating rollback; release failures are logged, not raised,
    /// so one stuck item cannot mask the original error
    async fn release_all(&self, input: &PurchaseInput, allocated: &[StockItem]) {
        for item in allocated {
            if let Err(err) = self
                .stock
                .release(&input.product_key, input.stock_type, item.id)
                .await
            {
                tracing::error!(item_id = %item.id, "failed to release allocated item: {err}");
            }
        }
    }

    async fn product(&self, product_key: &str) -> AppResult<Product> {
        let product = self
            .catalog
            .find_by_key(product_key)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(product_key.to_string()))?;
        if !product.active {
            return Err(AppError::ProductInactive(product_key.to_string()));
        }
        Ok(product)
    }

    /// Coarse catalog counters are display-side bookkeeping; a failure
    /// here is logged but does not undo the committed purchase. The
    /// product is reloaded and saved under its version so concurrent
    /// purchases never drop each other's decrements.
    async fn update_catalog_counters(&self, product_key: &str, quantity: u32) {
        for _ in 0..CATALOG_COUNTER_ATTEMPTS {
            let mut product = match self.catalog.find_by_key(product_key).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    tracing::error!(product_key, "product vanished before counter update");
                    return;
                }
                Err(err) => {
                    tracing::error!("failed to update catalog counters: {err}");
                    return;
                }
            };

            product.stock_count -= i64::from(quantity);
            product.sold_count += i64::from(quantity);
            product.updated_at = chrono::Utc::now();
            match self.catalog.save(product).await {
                Ok(_) => return,
                Err(AppError::Conflict(_)) => continue,
                Err(err) => {
                    tracing::error!("failed to update catalog counters: {err}");
                    return;
                }
            }
        }
        tracing::error!(product_key, "catalog counters still contended, giving up");
    }

    /// Generate an order number, looping until it does not collide
    /// with an existing order
    pub async fn generate_order_number(&self) -> AppResult<String> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!(
                "TRP-{}-{}",
                chrono::Utc::now().format("%Y%m%d"),
                suffix[..8].to_uppercase()
            );
            if !self.orders.exists_by_order_number(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "could not generate a unique order number".to_string(),
        ))
    }
}
