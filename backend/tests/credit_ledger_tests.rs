//! Credit ledger behavior over the in-memory stores

mod common;

use common::{business_retailer, context, dec};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{AccountType, CreditTransactionType, LimitStatus, RetailerAccount, RetailerLimit};
use topup_retail_backend::external::TemplateKind;
use topup_retail_backend::repository::RetailerRepository;
use uuid::Uuid;

#[tokio::test]
async fn test_open_requires_business_account() {
    let ctx = context();
    let personal = ctx
        .retailers
        .save(RetailerAccount::new(
            "person@example.com",
            "Someone",
            AccountType::Personal,
        ))
        .await
        .unwrap();

    let err = ctx
        .ledger
        .open(personal.id, dec("1000"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_BUSINESS_ACCOUNT");
}

#[tokio::test]
async fn test_open_unknown_retailer() {
    let ctx = context();
    let err = ctx
        .ledger
        .open(Uuid::new_v4(), dec("1000"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_open_twice_rejected() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    let err = ctx
        .ledger
        .open(retailer_id, dec("2000"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_open_rejects_non_positive_limit() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    let err = ctx.ledger.open(retailer_id, dec("0"), None).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_use_payment_scenario() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    let limit = ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    assert_eq!(limit.low_credit_threshold, dec("100.00"));

    let limit = ctx
        .ledger
        .use_credit(retailer_id, dec("950"), None, "bulk top-up order")
        .await
        .unwrap();
    assert_eq!(limit.available_credit(), dec("50"));
    assert_eq!(limit.outstanding_amount, dec("950"));

    // 950 of 1000 used leaves 50, below the 100 floor
    let err = ctx
        .ledger
        .use_credit(retailer_id, dec("100"), None, "second order")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_CREDIT");

    let limit = ctx
        .ledger
        .receive_payment(retailer_id, dec("500"), None, "bank transfer")
        .await
        .unwrap();
    assert_eq!(limit.available_credit(), dec("550"));
    assert_eq!(limit.outstanding_amount, dec("450"));

    // The retry now fits
    let limit = ctx
        .ledger
        .use_credit(retailer_id, dec("100"), None, "second order")
        .await
        .unwrap();
    assert_eq!(limit.available_credit(), dec("450"));
}

#[tokio::test]
async fn test_every_operation_appends_one_transaction() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    ctx.ledger
        .use_credit(retailer_id, dec("200"), None, "order")
        .await
        .unwrap();
    ctx.ledger
        .receive_payment(retailer_id, dec("50"), None, "payment")
        .await
        .unwrap();
    let limit = ctx
        .ledger
        .refund_credit(retailer_id, dec("150"), None, None, "order cancelled")
        .await
        .unwrap();

    assert_eq!(limit.transactions.len(), 3);
    let kinds: Vec<_> = limit
        .transactions
        .iter()
        .map(|t| t.transaction_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CreditTransactionType::Use,
            CreditTransactionType::Payment,
            CreditTransactionType::Refund,
        ]
    );
    // Each entry snapshots the balance after it applied
    assert_eq!(limit.transactions[0].balance_after, dec("800"));
    assert_eq!(limit.transactions[1].balance_after, dec("850"));
    assert_eq!(limit.transactions[2].balance_after, dec("1000"));
}

#[tokio::test]
async fn test_suspended_ledger_rejects_use() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    ctx.ledger
        .set_status(retailer_id, LimitStatus::Suspended, None, "manual review")
        .await
        .unwrap();

    let err = ctx
        .ledger
        .use_credit(retailer_id, dec("10"), None, "order")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "LEDGER_NOT_ACTIVE");
}

#[tokio::test]
async fn test_status_change_leaves_audit_marker() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;
    let admin = Uuid::new_v4();

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    let limit = ctx
        .ledger
        .set_status(retailer_id, LimitStatus::Suspended, Some(admin), "manual review")
        .await
        .unwrap();

    let marker = limit.transactions.last().unwrap();
    assert_eq!(marker.transaction_type, CreditTransactionType::Adjustment);
    assert_eq!(marker.amount, Decimal::ZERO);
    assert_eq!(marker.processed_by, Some(admin));
    assert!(marker.description.contains("active -> suspended"));
    assert!(marker.description.contains("manual review"));
}

#[tokio::test]
async fn test_adjust_limit_rescales_threshold() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    let limit = ctx
        .ledger
        .adjust_credit_limit(retailer_id, dec("2000"), None, "good payment history")
        .await
        .unwrap();

    assert_eq!(limit.credit_limit, dec("2000"));
    assert_eq!(limit.low_credit_threshold, dec("200.00"));
    // The adjustment entry carries the delta
    assert_eq!(limit.transactions.last().unwrap().amount, dec("1000"));
}

#[tokio::test]
async fn test_notifications_fire_after_commit() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();

    // 950 used leaves 50 available, at or below the 100 floor
    ctx.ledger
        .use_credit(retailer_id, dec("950"), None, "order")
        .await
        .unwrap();
    assert_eq!(
        ctx.notifier.templates().await,
        vec![TemplateKind::LowCreditAlert]
    );

    // Exhausting credit upgrades the alert
    ctx.ledger
        .use_credit(retailer_id, dec("50"), None, "order")
        .await
        .unwrap();
    assert_eq!(
        ctx.notifier.templates().await.last(),
        Some(&TemplateKind::CreditLimitExceeded)
    );

    ctx.ledger
        .receive_payment(retailer_id, dec("500"), None, "payment")
        .await
        .unwrap();
    assert_eq!(
        ctx.notifier.templates().await.last(),
        Some(&TemplateKind::PaymentReceived)
    );
}

#[tokio::test]
async fn test_no_alert_when_alerts_disabled() {
    let ctx = context();
    let retailer_id = business_retailer(&ctx).await;

    ctx.ledger.open(retailer_id, dec("1000"), None).await.unwrap();
    ctx.ledger
        .set_alerts_enabled(retailer_id, false)
        .await
        .unwrap();

    // Lands below the floor, but alerts are off
    ctx.ledger
        .use_credit(retailer_id, dec("950"), None, "order")
        .await
        .unwrap();
    assert!(ctx.notifier.templates().await.is_empty());
}

#[tokio::test]
async fn test_has_sufficient_credit_without_ledger() {
    let ctx = context();
    assert!(!ctx
        .ledger
        .has_sufficient_credit(Uuid::new_v4(), dec("1"))
        .await
        .unwrap());
}

proptest! {
    /// Any sequence of uses, payments, and refunds keeps the ledger
    /// internally consistent: balances never go negative and available
    /// credit always equals max(0, limit - used).
    #[test]
    fn prop_ledger_balances_stay_consistent(ops in proptest::collection::vec((0u8..3, 1u32..5000), 0..40)) {
        let mut limit = RetailerLimit::new(Uuid::new_v4(), Decimal::from(10_000), Decimal::from(1_000), None);

        for (op, raw) in ops {
            let amount = Decimal::from(raw);
            match op {
                0 => {
                    if amount <= limit.available_credit() {
                        limit.apply_use(amount);
                    }
                }
                1 => limit.apply_payment(amount),
                _ => limit.apply_refund(amount),
            }

            prop_assert!(limit.used_credit >= Decimal::ZERO);
            prop_assert!(limit.outstanding_amount >= Decimal::ZERO);
            let expected = (limit.credit_limit - limit.used_credit).max(Decimal::ZERO);
            prop_assert_eq!(limit.available_credit(), expected);
        }
    }
}
