//! Top-Up Retail Platform - Backend Server
//!
//! Runs the periodic credit ledger sweeps over in-memory repositories
//! until shutdown. Purchase, stock, and import services are library
//! surface for the transport layer and its tests.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topup_retail_backend::config::Config;
use topup_retail_backend::external::LoggingNotifier;
use topup_retail_backend::repository::memory::{
    InMemoryRetailerLimitRepository, InMemoryRetailerRepository,
};
use topup_retail_backend::services::{CreditLedgerService, SweepService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trp_server=debug,topup_retail_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Top-Up Retail Platform Server");
    tracing::info!("Environment: {}", config.environment);

    let limits = Arc::new(InMemoryRetailerLimitRepository::new());
    let retailers = Arc::new(InMemoryRetailerRepository::new());
    let notifier = Arc::new(LoggingNotifier);

    let ledger = CreditLedgerService::new(
        limits.clone(),
        retailers.clone(),
        notifier.clone(),
        config.credit.low_credit_threshold_ratio,
    );
    let sweeps = SweepService::new(ledger, limits, retailers, notifier);

    tracing::info!("Services initialized");

    // Periodic sweeps
    let alert_sweeps = sweeps.clone();
    let alert_interval = config.credit.alert_sweep_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(alert_interval));
        loop {
            ticker.tick().await;
            if let Err(err) = alert_sweeps.low_credit_sweep().await {
                tracing::error!("low credit sweep failed: {err}");
            }
        }
    });

    let overdue_sweeps = sweeps;
    let overdue_interval = config.credit.overdue_sweep_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(overdue_interval));
        loop {
            ticker.tick().await;
            let today = chrono::Utc::now().date_naive();
            if let Err(err) = overdue_sweeps.overdue_sweep(today).await {
                tracing::error!("overdue sweep failed: {err}");
            }
        }
    });

    tracing::info!(
        alert_interval_secs = alert_interval,
        overdue_interval_secs = overdue_interval,
        "Sweep schedulers running"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
