//! Top-Up Retail Platform - backend core
//!
//! Retailer credit ledgers and serialized stock pools (PIN/eSIM
//! codes), plus the purchase flow that moves both together. HTTP
//! controllers, persistence engines, and mail delivery live outside
//! this crate and plug in through the repository, notification, and
//! encryption ports.

pub mod config;
pub mod error;
pub mod external;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
