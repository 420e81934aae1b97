//! Retailer account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AccountType;

/// The slice of a user account the credit core needs: who to notify
/// and whether the account qualifies for a credit ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub account_type: AccountType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl RetailerAccount {
    pub fn new(email: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            account_type,
            active: true,
            created_at: Utc::now(),
        }
    }
}
