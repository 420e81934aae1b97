//! Shared test harness: services wired over in-memory repositories
//! with a recording notifier.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::{AccountType, Product, RetailerAccount, StockItem};
use topup_retail_backend::external::{
    Base64Codec, NotificationError, NotificationPort, TemplateKind,
};
use topup_retail_backend::repository::memory::{
    InMemoryCatalogRepository, InMemoryOrderRepository, InMemoryRetailerLimitRepository,
    InMemoryRetailerRepository, InMemoryStockPoolRepository,
};
use topup_retail_backend::repository::{CatalogRepository, RetailerRepository};
use topup_retail_backend::services::{
    CreditLedgerService, PurchaseService, StockImportService, StockPoolService, SweepService,
};

/// Captures every dispatched notification for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, TemplateKind)>>,
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        template: TemplateKind,
        _params: HashMap<String, String>,
    ) -> Result<(), NotificationError> {
        self.sent.lock().await.push((recipient.to_string(), template));
        Ok(())
    }
}

impl RecordingNotifier {
    pub async fn templates(&self) -> Vec<TemplateKind> {
        self.sent.lock().await.iter().map(|(_, t)| *t).collect()
    }
}

pub struct TestContext {
    pub catalog: Arc<InMemoryCatalogRepository>,
    pub retailers: Arc<InMemoryRetailerRepository>,
    pub orders: Arc<InMemoryOrderRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub stock: StockPoolService,
    pub ledger: CreditLedgerService,
    pub purchase: PurchaseService,
    pub import: StockImportService,
    pub sweeps: SweepService,
}

pub fn context() -> TestContext {
    let pools = Arc::new(InMemoryStockPoolRepository::new());
    let limits = Arc::new(InMemoryRetailerLimitRepository::new());
    let orders = Arc::new(InMemoryOrderRepository::new());
    let catalog = Arc::new(InMemoryCatalogRepository::new());
    let retailers = Arc::new(InMemoryRetailerRepository::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let stock = StockPoolService::new(pools);
    let ledger = CreditLedgerService::new(
        limits.clone(),
        retailers.clone(),
        notifier.clone(),
        Decimal::new(10, 2),
    );
    let purchase = PurchaseService::new(
        ledger.clone(),
        stock.clone(),
        orders.clone(),
        catalog.clone(),
    );
    let import = StockImportService::new(stock.clone(), Arc::new(Base64Codec), "default");
    let sweeps = SweepService::new(ledger.clone(), limits, retailers.clone(), notifier.clone());

    TestContext {
        catalog,
        retailers,
        orders,
        notifier,
        stock,
        ledger,
        purchase,
        import,
        sweeps,
    }
}

/// Seed a business retailer account and return its id
pub async fn business_retailer(ctx: &TestContext) -> Uuid {
    let account = RetailerAccount::new("shop@example.com", "Corner Shop", AccountType::Business);
    ctx.retailers.save(account).await.unwrap().id
}

/// Seed an active catalog product with the given price and stock count
pub async fn seed_product(ctx: &TestContext, product_key: &str, price: &str, stock_count: i64) {
    let mut product = Product::new(product_key, product_key, price.parse().unwrap());
    product.stock_count = stock_count;
    ctx.catalog.save(product).await.unwrap();
}

/// Build `count` plaintext stock items with sequential serials
pub fn items(count: usize) -> Vec<StockItem> {
    (0..count)
        .map(|i| {
            let mut item = StockItem::new(format!("PIN-{i:04}"));
            item.serial_number = Some(format!("SER-{i:06}"));
            item
        })
        .collect()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}
