//! Periodic ledger sweeps
//!
//! Two background passes over the credit ledgers: a low-credit sweep
//! that re-alerts retailers sitting at or below their floor, and an
//! overdue sweep that suspends ledgers with outstanding debt past the
//! due date. Both are resilient per retailer: one failing ledger is
//! logged and the sweep moves on.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use shared::{LimitStatus, RetailerLimit};

use crate::error::AppResult;
use crate::external::{dispatch, NotificationPort, TemplateKind};
use crate::repository::{RetailerLimitRepository, RetailerRepository};
use crate::services::CreditLedgerService;

/// Scheduled maintenance passes over the credit ledgers
#[derive(Clone)]
pub struct SweepService {
    ledger: CreditLedgerService,
    limits: Arc<dyn RetailerLimitRepository>,
    retailers: Arc<dyn RetailerRepository>,
    notifier: Arc<dyn NotificationPort>,
}

impl SweepService {
    pub fn new(
        ledger: CreditLedgerService,
        limits: Arc<dyn RetailerLimitRepository>,
        retailers: Arc<dyn RetailerRepository>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            ledger,
            limits,
            retailers,
            notifier,
        }
    }

    /// Alert every active ledger with alerts enabled whose available
    /// credit sits at or below its low-credit floor. Returns how many
    /// alerts went out.
    pub async fn low_credit_sweep(&self) -> AppResult<usize> {
        let active = self.limits.find_by_status(LimitStatus::Active).await?;
        let mut alerted = 0usize;

        for limit in active {
            if !limit.alerts_enabled || limit.available_credit() > limit.low_credit_threshold {
                continue;
            }
            self.notify(&limit, TemplateKind::LowCreditAlert).await;
            alerted += 1;
        }

        if alerted > 0 {
            tracing::info!(alerted, "low credit sweep finished");
        }
        Ok(alerted)
    }

    /// Suspend every active ledger with outstanding debt past its due
    /// date, then notify the retailer. Returns how many ledgers were
    /// suspended.
    pub async fn overdue_sweep(&self, today: NaiveDate) -> AppResult<usize> {
        let overdue = self.limits.find_overdue(today).await?;
        let mut suspended = 0usize;

        for limit in overdue {
            if !limit.is_active() {
                continue;
            }
            match self
                .ledger
                .set_status(
                    limit.retailer_id,
                    LimitStatus::Suspended,
                    None,
                    "payment overdue",
                )
                .await
            {
                Ok(saved) => {
                    self.notify(&saved, TemplateKind::OverduePayment).await;
                    suspended += 1;
                }
                Err(err) => {
                    tracing::error!(
                        retailer_id = %limit.retailer_id,
                        "overdue suspension failed: {err}"
                    );
                }
            }
        }

        if suspended > 0 {
            tracing::warn!(suspended, "overdue sweep suspended ledgers");
        }
        Ok(suspended)
    }

    async fn notify(&self, limit: &RetailerLimit, template: TemplateKind) {
        let account = match self.retailers.find_by_id(limit.retailer_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::warn!(retailer_id = %limit.retailer_id, "no account for sweep notification");
                return;
            }
            Err(err) => {
                tracing::warn!(retailer_id = %limit.retailer_id, "account lookup failed: {err}");
                return;
            }
        };

        let mut params = HashMap::new();
        params.insert("retailer_name".to_string(), account.name.clone());
        params.insert("available_credit".to_string(), limit.available_credit().to_string());
        params.insert(
            "outstanding_amount".to_string(),
            limit.outstanding_amount.to_string(),
        );
        if let Some(due) = limit.next_due_date {
            params.insert("due_date".to_string(), due.to_string());
        }

        dispatch(self.notifier.as_ref(), &account.email, template, params).await;
    }
}
