// Entity Models
//
// Typed views of the three stored tables. Each entity can be built from a
// raw `db::Record`; missing or NULL columns fall back to defaults instead of
// failing, so partially populated rows still load.

pub mod account;
pub mod category;
pub mod transaction;

pub use account::Account;
pub use category::{Category, DEFAULT_CATEGORIES};
pub use transaction::{Transaction, TransactionDraft, TransactionType};

/// Fresh opaque identifier (UUID v4, hex without hyphens)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
