//! Shared types and models for the Top-Up Retail Platform
//!
//! This crate contains the domain model of the retailer credit and
//! stock-allocation core, shared between the backend and any future
//! surfaces of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
