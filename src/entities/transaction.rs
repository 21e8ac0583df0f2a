// 💸 Transaction Entity
//
// The stored amount is always a non-negative magnitude; the sign comes from
// the type. An Income adds `amount` to its account's balance, an Expense
// subtracts it.

use crate::db::{Record, RecordExt};
use crate::error::{LedgerError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored date format (zero-padded ISO, so string order == date order)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// TRANSACTION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money coming in
    Income,

    /// Money going out
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }

    /// Balance effect of `amount` under this type
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }

    /// Lenient reading of a stored value: anything other than "Income" is
    /// treated as an expense
    pub fn from_stored(value: &str) -> Self {
        if value == "Income" {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    /// Strict parse for caller input (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(LedgerError::Validation(format!(
                "unknown transaction type '{}' (expected Income or Expense)",
                other
            ))),
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,

    /// `YYYY-MM-DD`
    pub date: String,

    /// Non-negative magnitude
    pub amount: f64,

    pub category: String,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Transaction {
    /// Build from a raw row; missing columns default
    pub fn from_record(record: &Record) -> Self {
        Transaction {
            id: record.text("id").unwrap_or_default().to_string(),
            account_id: record.text("account_id").unwrap_or_default().to_string(),
            date: record.text("date").unwrap_or_default().to_string(),
            amount: record.real("amount").unwrap_or(0.0),
            category: record.text("category").unwrap_or_default().to_string(),
            kind: record
                .text("type")
                .map(TransactionType::from_stored)
                .unwrap_or_default(),
            note: record.text("note").map(str::to_string),
        }
    }

    /// Effect on the account balance
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.parsed_date().map(|d| d.day())
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

// ============================================================================
// DRAFT (input to add/update)
// ============================================================================

/// Field values for a transaction that is about to be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub note: Option<String>,
}

impl TransactionDraft {
    pub fn new(
        account_id: impl Into<String>,
        date: NaiveDate,
        amount: f64,
        kind: TransactionType,
    ) -> Self {
        TransactionDraft {
            account_id: account_id.into(),
            date,
            amount,
            category: String::new(),
            kind,
            note: None,
        }
    }

    /// Builder pattern: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder pattern: set note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }

    /// Amount must be a finite, non-negative magnitude; the date must render
    /// as a four-digit-year `YYYY-MM-DD`
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        if !(0..=9999).contains(&self.date.year()) {
            return Err(LedgerError::Validation(format!(
                "date {} is outside years 0000..=9999",
                self.date
            )));
        }
        Ok(())
    }

    /// The transaction this draft becomes under `id`
    pub fn into_transaction(self, id: String) -> Transaction {
        let date = self.date_string();
        Transaction {
            id,
            account_id: self.account_id,
            date,
            amount: self.amount,
            category: self.category,
            kind: self.kind,
            note: self.note,
        }
    }
}

/// Parse a caller-supplied `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| LedgerError::Validation(format!("invalid date '{}' (expected YYYY-MM-DD)", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_signed_effect() {
        assert_eq!(TransactionType::Income.signed(100.0), 100.0);
        assert_eq!(TransactionType::Expense.signed(100.0), -100.0);
    }

    #[test]
    fn test_type_parse() {
        assert_eq!("Income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!(" expense ".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("Transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_stored_type_is_lenient() {
        assert_eq!(TransactionType::from_stored("Income"), TransactionType::Income);
        assert_eq!(TransactionType::from_stored("Expense"), TransactionType::Expense);
        assert_eq!(TransactionType::from_stored("garbage"), TransactionType::Expense);
    }

    #[test]
    fn test_from_sparse_record_defaults() {
        let record = json!({ "id": "t1", "account_id": "a1", "date": "2024-03-05" })
            .as_object()
            .cloned()
            .unwrap();
        let tx = Transaction::from_record(&record);

        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.category, "");
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.note, None);
        assert_eq!(tx.day_of_month(), Some(5));
    }

    #[test]
    fn test_from_full_record() {
        let record = json!({
            "id": "t1",
            "account_id": "a1",
            "date": "2023-10-28",
            "amount": 200.0,
            "category": "Salary",
            "type": "Income",
            "note": "Freelance"
        })
        .as_object()
        .cloned()
        .unwrap();
        let tx = Transaction::from_record(&record);

        assert!(tx.is_income());
        assert_eq!(tx.signed_amount(), 200.0);
        assert_eq!(tx.note.as_deref(), Some("Freelance"));
        assert_eq!(tx.parsed_date(), Some(date(2023, 10, 28)));
    }

    #[test]
    fn test_draft_builder_and_conversion() {
        let draft = TransactionDraft::new("a1", date(2023, 10, 27), 100.0, TransactionType::Expense)
            .with_category("Food")
            .with_note("Lunch");

        assert_eq!(draft.date_string(), "2023-10-27");
        assert_eq!(draft.signed_amount(), -100.0);

        let tx = draft.into_transaction("t1".to_string());
        assert_eq!(tx.id, "t1");
        assert_eq!(tx.date, "2023-10-27");
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.note.as_deref(), Some("Lunch"));
    }

    #[test]
    fn test_draft_validation() {
        let ok = TransactionDraft::new("a1", date(2024, 1, 1), 0.0, TransactionType::Income);
        assert!(ok.validate().is_ok());

        let negative = TransactionDraft::new("a1", date(2024, 1, 1), -5.0, TransactionType::Income);
        assert!(matches!(negative.validate(), Err(LedgerError::Validation(_))));

        let nan = TransactionDraft::new("a1", date(2024, 1, 1), f64::NAN, TransactionType::Income);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_draft_rejects_dates_without_four_digit_year() {
        let far = TransactionDraft::new("a1", date(10000, 1, 1), 1.0, TransactionType::Expense);
        assert!(matches!(far.validate(), Err(LedgerError::Validation(_))));

        let negative = TransactionDraft::new("a1", date(-1, 12, 31), 1.0, TransactionType::Expense);
        assert!(negative.validate().is_err());

        let edge = TransactionDraft::new("a1", date(9999, 12, 31), 1.0, TransactionType::Expense);
        assert!(edge.validate().is_ok());
        assert_eq!(edge.date_string(), "9999-12-31");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("10/27/2023").is_err());
    }

    #[test]
    fn test_serializes_type_field() {
        let tx = TransactionDraft::new("a1", date(2024, 1, 1), 1.0, TransactionType::Income)
            .into_transaction("t1".to_string());
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "Income");
        assert!(value.get("note").is_none());
    }
}
