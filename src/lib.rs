// Budget Ledger - Core Library
// Ledger consistency engine: accounts, income/expense transactions, and the
// month-scoped aggregates built on top of them. Used by the CLI, the API
// server, and tests.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod months;
pub mod report;

#[cfg(feature = "server")]
pub mod api;

use std::sync::Once;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use db::{setup_database, Record, RecordExt, Store};
pub use entities::{
    Account, Category, Transaction, TransactionDraft, TransactionType, DEFAULT_CATEGORIES,
};
pub use error::{LedgerError, Result};
pub use ledger::{DayActivity, Ledger, MonthlySummary, TransactionFilter};
pub use months::{month_range, MonthEntry, MonthKey};
pub use report::{CategoryShare, MonthlyReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static INIT_TRACING: Once = Once::new();

/// Install the global fmt subscriber once.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (usually
/// `LedgerConfig::log_filter`) is used.
pub fn init_tracing(default_filter: &str) {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        // Another subscriber may already be installed (e.g. by a test harness)
        let _ = fmt().with_env_filter(filter).try_init();
        tracing::debug!(version = VERSION, "tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing("budget_ledger=debug");
        super::init_tracing("budget_ledger=info");
    }
}
