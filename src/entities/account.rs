// 💳 Account Entity
//
// Identity (`id`) never changes. `name` and `balance` change by direct edit
// or, for `balance`, by every transaction recorded against the account.

use crate::db::{Record, RecordExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity, assigned on creation
    pub id: String,

    /// Display name (e.g. "BofA Checking")
    pub name: String,

    /// Current balance: opening balance plus the signed effect of every
    /// transaction referencing this account
    pub balance: f64,
}

impl Account {
    /// New account with a fresh identity
    pub fn new(name: impl Into<String>, balance: f64) -> Self {
        Account {
            id: super::new_id(),
            name: name.into(),
            balance,
        }
    }

    /// Build from a raw row; missing columns default (balance 0.0)
    pub fn from_record(record: &Record) -> Self {
        Account {
            id: record.text("id").unwrap_or_default().to_string(),
            name: record.text("name").unwrap_or_default().to_string(),
            balance: record.real("balance").unwrap_or(0.0),
        }
    }

    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }
}
