//! Error handling for the Top-Up Retail Platform backend
//!
//! Every business-rule violation is a typed variant with a stable
//! machine-readable code, so callers (and any future transport layer)
//! can map them without string matching.

use rust_decimal::Decimal;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    // Conflict / business-rule errors
    #[error("A credit ledger already exists for this retailer")]
    AlreadyExists,

    #[error("Retailer account is not a business account")]
    NotBusinessAccount,

    #[error("No credit ledger is configured for this retailer")]
    LedgerNotConfigured,

    #[error("Credit ledger is not active")]
    LedgerNotActive,

    #[error("Insufficient credit: requested {requested}, available {available}")]
    InsufficientCredit {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("No stock available for product {product_key}")]
    NoStockAvailable { product_key: String },

    #[error("Pool has assigned or used items and cannot be deleted")]
    PoolInUse,

    #[error("Item is assigned or used and cannot be deleted")]
    ItemInUse,

    #[error("Concurrent modification of {0}")]
    Conflict(String),

    // Not-found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product is not active: {0}")]
    ProductInactive(String),

    // Infrastructure errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::AlreadyExists => "ALREADY_EXISTS",
            AppError::NotBusinessAccount => "NOT_BUSINESS_ACCOUNT",
            AppError::LedgerNotConfigured => "LEDGER_NOT_CONFIGURED",
            AppError::LedgerNotActive => "LEDGER_NOT_ACTIVE",
            AppError::InsufficientCredit { .. } => "INSUFFICIENT_CREDIT",
            AppError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            AppError::NoStockAvailable { .. } => "NO_STOCK_AVAILABLE",
            AppError::PoolInUse => "POOL_IN_USE",
            AppError::ItemInUse => "ITEM_IN_USE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            AppError::ProductInactive(_) => "PRODUCT_INACTIVE",
            AppError::Encryption(_) => "ENCRYPTION_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for the backend services
pub type AppResult<T> = Result<T, AppError>;
