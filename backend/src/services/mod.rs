//! Business logic services for the Top-Up Retail Platform backend

pub mod credit_ledger;
pub mod purchase;
pub mod stock_import;
pub mod stock_pool;
pub mod sweeps;

pub use credit_ledger::CreditLedgerService;
pub use purchase::{PurchaseInput, PurchaseReceipt, PurchaseService};
pub use stock_import::{ImportReport, StockImportService};
pub use stock_pool::StockPoolService;
pub use sweeps::SweepService;
