//! Notification port
//!
//! Ledger state transitions trigger template-keyed notifications.
//! Dispatch is strictly fire-and-forget: it happens after the state
//! change is committed, and a send failure is logged and swallowed so
//! it can never roll back or block committed state.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Notification templates used by the credit core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    LowCreditAlert,
    CreditLimitExceeded,
    PaymentReceived,
    CreditLimitUpdated,
    StatusChanged,
    OverduePayment,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::LowCreditAlert => "low_credit_alert",
            TemplateKind::CreditLimitExceeded => "credit_limit_exceeded",
            TemplateKind::PaymentReceived => "payment_received",
            TemplateKind::CreditLimitUpdated => "credit_limit_updated",
            TemplateKind::StatusChanged => "status_changed",
            TemplateKind::OverduePayment => "overdue_payment",
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification send failed: {0}")]
    Send(String),
}

/// Outbound notification channel (email/SMS behind a template engine)
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(
        &self,
        recipient: &str,
        template: TemplateKind,
        params: HashMap<String, String>,
    ) -> Result<(), NotificationError>;
}

/// Send a notification without letting a failure escape the caller
pub async fn dispatch(
    port: &dyn NotificationPort,
    recipient: &str,
    template: TemplateKind,
    params: HashMap<String, String>,
) {
    if let Err(err) = port.notify(recipient, template, params).await {
        tracing::warn!(
            template = template.as_str(),
            recipient,
            "notification dispatch failed: {err}"
        );
    }
}

/// Adapter that only logs; the default for development and tests
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationPort for LoggingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        template: TemplateKind,
        params: HashMap<String, String>,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            template = template.as_str(),
            recipient,
            ?params,
            "notification dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_notifier_never_fails() {
        let notifier = LoggingNotifier;
        let result = notifier
            .notify("shop@example.com", TemplateKind::LowCreditAlert, HashMap::new())
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_template_keys() {
        assert_eq!(TemplateKind::LowCreditAlert.as_str(), "low_credit_alert");
        assert_eq!(TemplateKind::OverduePayment.as_str(), "overdue_payment");
    }
}
