//! Configuration management for the Top-Up Retail Platform backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with TRP_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Credit ledger configuration
    pub credit: CreditConfig,

    /// Bulk stock import configuration
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreditConfig {
    /// Fraction of the credit limit kept as the low-credit alert floor
    /// (0.10 means alerts fire once 90% of the limit is utilized)
    pub low_credit_threshold_ratio: Decimal,

    /// Seconds between low-credit alert sweeps
    pub alert_sweep_interval_secs: u64,

    /// Seconds between overdue-account sweeps
    pub overdue_sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Bucket used for rows with no product column and no caller default
    pub default_product_key: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("TRP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("credit.low_credit_threshold_ratio", "0.10")?
            .set_default("credit.alert_sweep_interval_secs", 300)?
            .set_default("credit.overdue_sweep_interval_secs", 3600)?
            .set_default("import.default_product_key", "default")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (TRP_ prefix)
            .add_source(
                Environment::with_prefix("TRP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            low_credit_threshold_ratio: Decimal::new(10, 2),
            alert_sweep_interval_secs: 300,
            overdue_sweep_interval_secs: 3600,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_product_key: "default".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credit_config() {
        let credit = CreditConfig::default();
        assert_eq!(credit.low_credit_threshold_ratio, Decimal::new(10, 2));
        assert!(credit.alert_sweep_interval_secs > 0);
    }

    #[test]
    fn test_default_import_bucket() {
        assert_eq!(ImportConfig::default().default_product_key, "default");
    }
}
