//! Credit ledger service
//!
//! Maintains one auditable running balance per retailer. Every
//! balance-changing operation appends exactly one transaction with the
//! post-change available credit, and all mutations on a retailer's
//! ledger run under that retailer's lock. Notifications go out only
//! after the ledger is saved and never fail the operation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    round_money, validate_positive_amount, CreditTransactionType, LimitStatus, RetailerAccount,
    RetailerLimit,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{dispatch, NotificationPort, TemplateKind};
use crate::repository::{KeyedMutex, RetailerLimitRepository, RetailerRepository};

/// Credit ledger engine
#[derive(Clone)]
pub struct CreditLedgerService {
    limits: Arc<dyn RetailerLimitRepository>,
    retailers: Arc<dyn RetailerRepository>,
    notifier: Arc<dyn NotificationPort>,
    /// Fraction of the limit used as the default low-credit floor
    threshold_ratio: Decimal,
    locks: Arc<KeyedMutex>,
}

fn ledger_key(retailer_id: Uuid) -> String {
    format!("ledger:{retailer_id}")
}

impl CreditLedgerService {
    pub fn new(
        limits: Arc<dyn RetailerLimitRepository>,
        retailers: Arc<dyn RetailerRepository>,
        notifier: Arc<dyn NotificationPort>,
        threshold_ratio: Decimal,
    ) -> Self {
        Self {
            limits,
            retailers,
            notifier,
            threshold_ratio,
            locks: Arc::new(KeyedMutex::new()),
        }
    }

    /// Open a credit ledger for a retailer. Exactly one ledger may
    /// exist per retailer, and only business accounts qualify.
    pub async fn open(
        &self,
        retailer_id: Uuid,
        credit_limit: Decimal,
        actor: Option<Uuid>,
    ) -> AppResult<RetailerLimit> {
        validate_positive_amount(credit_limit)
            .map_err(|msg| AppError::validation("credit_limit", msg))?;

        let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

        if self.limits.exists_by_retailer_id(retailer_id).await? {
            return Err(AppError::AlreadyExists);
        }

        let account = self.account(retailer_id).await?;
        if account.account_type != shared::AccountType::Business {
            return Err(AppError::NotBusinessAccount);
        }

        let threshold = round_money(credit_limit * self.threshold_ratio);
        let limit = RetailerLimit::new(retailer_id, credit_limit, threshold, actor);
        let limit = self.limits.save(limit).await?;
        tracing::info!(
            retailer_id = %retailer_id,
            credit_limit = %credit_limit,
            "credit ledger opened"
        );
        Ok(limit)
    }

    /// Debit the ledger for a purchase. Requires an Active ledger and
    /// enough available credit; appends a Use transaction.
    pub async fn use_credit(
        &self,
        retailer_id: Uuid,
        amount: Decimal,
        order_id: Option<Uuid>,
        description: &str,
    ) -> AppResult<RetailerLimit> {
        validate_positive_amount(amount).map_err(|msg| AppError::validation("amount", msg))?;

        let saved = {
            let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

            let mut limit = self.load(retailer_id).await?;
            if !limit.is_active() {
                return Err(AppError::LedgerNotActive);
            }
            let available = limit.available_credit();
            if amount > available {
                return Err(AppError::InsufficientCredit {
                    requested: amount,
                    available,
                });
            }

            limit.apply_use(amount);
            limit.record(CreditTransactionType::Use, amount, description, order_id, None);
            self.limits.save(limit).await?
        };

        // Alerts fire only after the debit is committed
        let available = saved.available_credit();
        if available.is_zero() {
            self.notify_balance(&saved, TemplateKind::CreditLimitExceeded).await;
        } else if saved.alerts_enabled && available <= saved.low_credit_threshold {
            self.notify_balance(&saved, TemplateKind::LowCreditAlert).await;
        }

        Ok(saved)
    }

    /// Record a payment against outstanding debt, freeing available
    /// credit; appends a Payment transaction.
    pub async fn receive_payment(
        &self,
        retailer_id: Uuid,
        amount: Decimal,
        actor: Option<Uuid>,
        description: &str,
    ) -> AppResult<RetailerLimit> {
        validate_positive_amount(amount).map_err(|msg| AppError::validation("amount", msg))?;

        let saved = {
            let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

            let mut limit = self.load(retailer_id).await?;
            limit.apply_payment(amount);
            limit.record(CreditTransactionType::Payment, amount, description, None, actor);
            self.limits.save(limit).await?
        };

        self.notify_balance(&saved, TemplateKind::PaymentReceived).await;
        Ok(saved)
    }

    /// Reverse a prior use of credit; appends a Refund transaction
    pub async fn refund_credit(
        &self,
        retailer_id: Uuid,
        amount: Decimal,
        order_id: Option<Uuid>,
        actor: Option<Uuid>,
        description: &str,
    ) -> AppResult<RetailerLimit> {
        validate_positive_amount(amount).map_err(|msg| AppError::validation("amount", msg))?;

        let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

        let mut limit = self.load(retailer_id).await?;
        limit.apply_refund(amount);
        limit.record(CreditTransactionType::Refund, amount, description, order_id, actor);
        Ok(self.limits.save(limit).await?)
    }

    /// Change the credit ceiling itself; the low-credit floor is
    /// rescaled from the new limit. Appends an Adjustment transaction
    /// carrying the delta.
    pub async fn adjust_credit_limit(
        &self,
        retailer_id: Uuid,
        new_limit: Decimal,
        actor: Option<Uuid>,
        reason: &str,
    ) -> AppResult<RetailerLimit> {
        if new_limit < Decimal::ZERO {
            return Err(AppError::validation("credit_limit", "limit cannot be negative"));
        }

        let saved = {
            let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

            let mut limit = self.load(retailer_id).await?;
            let delta = new_limit - limit.credit_limit;
            limit.credit_limit = new_limit;
            limit.low_credit_threshold = round_money(new_limit * self.threshold_ratio);
            limit.record(CreditTransactionType::Adjustment, delta, reason, None, actor);
            self.limits.save(limit).await?
        };

        self.notify_balance(&saved, TemplateKind::CreditLimitUpdated).await;
        Ok(saved)
    }

    /// Administrative status override (e.g. Suspended). No balance
    /// changes, but a zero-amount Adjustment marker is still appended
    /// so the audit trail records who changed what and why.
    pub async fn set_status(
        &self,
        retailer_id: Uuid,
        new_status: LimitStatus,
        actor: Option<Uuid>,
        reason: &str,
    ) -> AppResult<RetailerLimit> {
        let saved = {
            let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

            let mut limit = self.load(retailer_id).await?;
            let old_status = limit.status;
            limit.status = new_status;
            limit.record(
                CreditTransactionType::Adjustment,
                Decimal::ZERO,
                format!("status {} -> {}: {reason}", old_status.as_str(), new_status.as_str()),
                None,
                actor,
            );
            self.limits.save(limit).await?
        };

        tracing::info!(
            retailer_id = %retailer_id,
            status = saved.status.as_str(),
            "ledger status changed"
        );
        self.notify_balance(&saved, TemplateKind::StatusChanged).await;
        Ok(saved)
    }

    /// Turn low-credit alerts on or off for this ledger
    pub async fn set_alerts_enabled(
        &self,
        retailer_id: Uuid,
        enabled: bool,
    ) -> AppResult<RetailerLimit> {
        let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

        let mut limit = self.load(retailer_id).await?;
        limit.alerts_enabled = enabled;
        Ok(self.limits.save(limit).await?)
    }

    /// Set or clear the next payment due date
    pub async fn set_due_date(
        &self,
        retailer_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> AppResult<RetailerLimit> {
        let _guard = self.locks.lock(&ledger_key(retailer_id)).await;

        let mut limit = self.load(retailer_id).await?;
        limit.next_due_date = due_date;
        Ok(self.limits.save(limit).await?)
    }

    /// Read-only credit check: an Active ledger with enough available
    /// credit. A missing ledger answers false, not an error.
    pub async fn has_sufficient_credit(&self, retailer_id: Uuid, amount: Decimal) -> AppResult<bool> {
        match self.limits.find_by_retailer_id(retailer_id).await? {
            Some(limit) => Ok(limit.is_active() && limit.available_credit() >= amount),
            None => Ok(false),
        }
    }

    /// Fetch the ledger; `LedgerNotConfigured` when none exists
    pub async fn get(&self, retailer_id: Uuid) -> AppResult<RetailerLimit> {
        self.load(retailer_id).await
    }

    async fn load(&self, retailer_id: Uuid) -> AppResult<RetailerLimit> {
        self.limits
            .find_by_retailer_id(retailer_id)
            .await?
            .ok_or(AppError::LedgerNotConfigured)
    }

    async fn account(&self, retailer_id: Uuid) -> AppResult<RetailerAccount> {
        self.retailers
            .find_by_id(retailer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Retailer".to_string()))
    }

    /// Fire-and-forget balance notification to the retailer's email
    async fn notify_balance(&self, limit: &RetailerLimit, template: TemplateKind) {
        let account = match self.retailers.find_by_id(limit.retailer_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::warn!(retailer_id = %limit.retailer_id, "no account for notification");
                return;
            }
            Err(err) => {
                tracing::warn!(retailer_id = %limit.retailer_id, "account lookup failed: {err}");
                return;
            }
        };

        let mut params = HashMap::new();
        params.insert("retailer_name".to_string(), account.name.clone());
        params.insert("credit_limit".to_string(), limit.credit_limit.to_string());
        params.insert("available_credit".to_string(), limit.available_credit().to_string());
        params.insert("outstanding_amount".to_string(), limit.outstanding_amount.to_string());
        params.insert("utilization".to_string(), limit.utilization().to_string());
        params.insert("status".to_string(), limit.status.as_str().to_string());

        dispatch(self.notifier.as_ref(), &account.email, template, params).await;
    }
}
