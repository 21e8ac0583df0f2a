// ⚠️ Error taxonomy for the ledger engine
//
// Every failure the engine can report is one of these variants. Callers
// branch on the value; nothing in the engine panics on bad input or a
// missing row.

use thiserror::Error;

/// Errors returned by the storage gateway and the ledger service
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Referenced account/transaction/category does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// SQLite failure (I/O, constraint violation, bad statement)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A value violates a data-model invariant the engine guards
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
