//! Domain models for the Top-Up Retail Platform

mod catalog;
mod credit;
mod order;
mod retailer;
mod stock;

pub use catalog::*;
pub use credit::*;
pub use order::*;
pub use retailer::*;
pub use stock::*;
