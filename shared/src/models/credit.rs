//! Retailer credit limit and transaction ledger models
//!
//! One `RetailerLimit` exists per business retailer. Every operation
//! that touches the balance appends exactly one `CreditTransaction`
//! carrying the available credit after the change, so the transaction
//! list is a complete audit trail of the running balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::percentage;

/// Ledger lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    Active,
    Suspended,
    Closed,
}

impl LimitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitStatus::Active => "active",
            LimitStatus::Suspended => "suspended",
            LimitStatus::Closed => "closed",
        }
    }
}

/// Ledger entry types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionType {
    Use,
    Payment,
    Refund,
    Adjustment,
}

impl CreditTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditTransactionType::Use => "use",
            CreditTransactionType::Payment => "payment",
            CreditTransactionType::Refund => "refund",
            CreditTransactionType::Adjustment => "adjustment",
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub transaction_type: CreditTransactionType,
    pub amount: Decimal,
    /// Available credit after this entry was applied
    pub balance_after: Decimal,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Credit ledger root for one retailer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerLimit {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub credit_limit: Decimal,
    pub used_credit: Decimal,
    pub outstanding_amount: Decimal,
    pub status: LimitStatus,
    /// Available-credit floor below which a low-credit alert fires
    pub low_credit_threshold: Decimal,
    pub alerts_enabled: bool,
    pub next_due_date: Option<NaiveDate>,
    /// Append-only transaction log, oldest first
    pub transactions: Vec<CreditTransaction>,
    /// Optimistic-concurrency version, bumped by the repository on save
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl RetailerLimit {
    pub fn new(
        retailer_id: Uuid,
        credit_limit: Decimal,
        low_credit_threshold: Decimal,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            retailer_id,
            credit_limit,
            used_credit: Decimal::ZERO,
            outstanding_amount: Decimal::ZERO,
            status: LimitStatus::Active,
            low_credit_threshold,
            alerts_enabled: true,
            next_due_date: None,
            transactions: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            created_by,
        }
    }

    /// Credit still spendable: `max(0, credit_limit - used_credit)`
    pub fn available_credit(&self) -> Decimal {
        let available = self.credit_limit - self.used_credit;
        if available < Decimal::ZERO {
            Decimal::ZERO
        } else {
            available
        }
    }

    /// Utilization as a percentage of the limit, two decimal places,
    /// zero when the limit itself is zero
    pub fn utilization(&self) -> Decimal {
        percentage(self.used_credit + self.outstanding_amount, self.credit_limit)
    }

    pub fn is_active(&self) -> bool {
        self.status == LimitStatus::Active
    }

    /// True when a due date has passed while debt is outstanding
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.next_due_date, Some(due) if due < today)
            && self.outstanding_amount > Decimal::ZERO
    }

    /// Increase used credit and outstanding debt by `amount`
    pub fn apply_use(&mut self, amount: Decimal) {
        self.used_credit += amount;
        self.outstanding_amount += amount;
        self.updated_at = Utc::now();
    }

    /// Pay down outstanding debt, freeing available credit. Both sides
    /// clamp at zero so an overpayment never drives a balance negative.
    pub fn apply_payment(&mut self, amount: Decimal) {
        self.outstanding_amount = clamp_zero(self.outstanding_amount - amount);
        self.used_credit = clamp_zero(self.used_credit - amount);
        self.updated_at = Utc::now();
    }

    /// Reverse a prior use of credit
    pub fn apply_refund(&mut self, amount: Decimal) {
        self.used_credit = clamp_zero(self.used_credit - amount);
        self.outstanding_amount = clamp_zero(self.outstanding_amount - amount);
        self.updated_at = Utc::now();
    }

    /// Append a ledger entry snapshotting the post-change balance
    pub fn record(
        &mut self,
        transaction_type: CreditTransactionType,
        amount: Decimal,
        description: impl Into<String>,
        order_id: Option<Uuid>,
        processed_by: Option<Uuid>,
    ) {
        self.transactions.push(CreditTransaction {
            id: Uuid::new_v4(),
            transaction_type,
            amount,
            balance_after: self.available_credit(),
            description: description.into(),
            order_id,
            processed_by,
            created_at: Utc::now(),
        });
    }
}

fn clamp_zero(value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ledger(limit: &str) -> RetailerLimit {
        RetailerLimit::new(Uuid::new_v4(), dec(limit), dec("100"), None)
    }

    #[test]
    fn test_available_credit_clamped() {
        let mut l = ledger("1000");
        assert_eq!(l.available_credit(), dec("1000"));
        l.used_credit = dec("1200");
        assert_eq!(l.available_credit(), Decimal::ZERO);
    }

    #[test]
    fn test_use_then_payment_frees_credit() {
        let mut l = ledger("1000");
        l.apply_use(dec("950"));
        assert_eq!(l.available_credit(), dec("50"));
        assert_eq!(l.outstanding_amount, dec("950"));

        l.apply_payment(dec("500"));
        assert_eq!(l.available_credit(), dec("550"));
        assert_eq!(l.outstanding_amount, dec("450"));
    }

    #[test]
    fn test_payment_clamps_at_zero() {
        let mut l = ledger("1000");
        l.apply_use(dec("100"));
        l.apply_payment(dec("500"));
        assert_eq!(l.used_credit, Decimal::ZERO);
        assert_eq!(l.outstanding_amount, Decimal::ZERO);
        assert_eq!(l.available_credit(), dec("1000"));
    }

    #[test]
    fn test_refund_restores_credit() {
        let mut l = ledger("1000");
        l.apply_use(dec("300"));
        l.apply_refund(dec("300"));
        assert_eq!(l.available_credit(), dec("1000"));
        assert_eq!(l.outstanding_amount, Decimal::ZERO);
    }

    #[test]
    fn test_utilization_rounding() {
        let mut l = ledger("300");
        l.apply_use(dec("100"));
        // (100 used + 100 outstanding) / 300 * 100 = 66.666...
        assert_eq!(l.utilization(), dec("66.67"));
    }

    #[test]
    fn test_utilization_zero_limit() {
        let l = ledger("0");
        assert_eq!(l.utilization(), Decimal::ZERO);
    }

    #[test]
    fn test_record_snapshots_balance() {
        let mut l = ledger("1000");
        l.apply_use(dec("950"));
        l.record(CreditTransactionType::Use, dec("950"), "top-up purchase", None, None);

        let entry = l.transactions.last().unwrap();
        assert_eq!(entry.balance_after, dec("50"));
        assert_eq!(entry.transaction_type, CreditTransactionType::Use);
    }

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let mut l = ledger("1000");
        assert!(!l.is_overdue(today));

        l.apply_use(dec("100"));
        l.next_due_date = NaiveDate::from_ymd_opt(2026, 8, 1);
        assert!(l.is_overdue(today));

        // Debt cleared: no longer overdue even past the date
        l.apply_payment(dec("100"));
        assert!(!l.is_overdue(today));
    }
}
