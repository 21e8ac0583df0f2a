// 🗄️ Storage Gateway - parameterized statements against SQLite
//
// Rows come back as column-name -> value mappings (`Record`). The entity
// layer builds typed values from them, tolerating missing columns.
//
// Each statement autocommits unless it runs inside `Store::atomically`,
// which wraps a closure in a single BEGIN/COMMIT and rolls back on error.

use crate::entities::category::DEFAULT_CATEGORIES;
use crate::entities::new_id;
use crate::error::{LedgerError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row, ToSql};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// One result row: column name -> value
pub type Record = serde_json::Map<String, Value>;

/// Typed lookups on a `Record`, `None` when the column is missing or NULL
pub trait RecordExt {
    fn text(&self, column: &str) -> Option<&str>;
    fn real(&self, column: &str) -> Option<f64>;
    fn integer(&self, column: &str) -> Option<i64>;
}

impl RecordExt for Record {
    fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    fn real(&self, column: &str) -> Option<f64> {
        // INTEGER and REAL both convert
        self.get(column).and_then(Value::as_f64)
    }

    fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection, wal: bool) -> Result<()> {
    // ON DELETE CASCADE only fires with foreign keys enabled
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            balance REAL DEFAULT 0.0
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT,
            type TEXT,
            note TEXT,
            FOREIGN KEY (account_id) REFERENCES accounts (id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);",
    )?;

    seed_categories(conn)?;

    Ok(())
}

/// Insert the default catalog the first time the store is initialized
fn seed_categories(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    for name in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO categories (id, name) VALUES (?1, ?2)",
            params![new_id(), name],
        )?;
    }

    info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    Ok(())
}

// ============================================================================
// STATEMENTS
// ============================================================================

fn log_failure(sql: &str, err: rusqlite::Error) -> LedgerError {
    warn!(error = %err, statement = sql, "statement failed");
    LedgerError::Storage(err)
}

/// Run a write statement, returning the number of affected rows
pub fn execute(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
    debug!(statement = sql, "execute");
    conn.execute(sql, params).map_err(|e| log_failure(sql, e))
}

/// Run a query and collect every row
pub fn fetch_all(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Record>> {
    debug!(statement = sql, "fetch_all");

    let run = || -> rusqlite::Result<Vec<Record>> {
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(to_record(row, &columns)?);
        }
        Ok(records)
    };

    run().map_err(|e| log_failure(sql, e))
}

/// Run a query and return its first row, if any
pub fn fetch_one(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Option<Record>> {
    Ok(fetch_all(conn, sql, params)?.into_iter().next())
}

fn to_record(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();

    for (idx, column) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => Value::from(f),
            ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
        };
        record.insert(column.clone(), value);
    }

    Ok(record)
}

// ============================================================================
// STORE
// ============================================================================

/// Owns the SQLite connection. The ledger service holds exactly one.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) a file-backed store and ensure the schema
    pub fn open(path: &Path, wal: bool) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn, wal)?;
        info!(path = %path.display(), "opened ledger store");
        Ok(Store { conn })
    }

    /// Fresh private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn, false)?;
        Ok(Store { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        execute(&self.conn, sql, params)
    }

    pub fn fetch_all(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Record>> {
        fetch_all(&self.conn, sql, params)
    }

    pub fn fetch_one(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Option<Record>> {
        fetch_one(&self.conn, sql, params)
    }

    /// Run `f` inside one explicit transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back every statement `f` issued
    /// when it returns `Err`.
    pub fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self.conn.transaction()?;

        match f(&*tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "rolling back");
                tx.rollback()?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_account(store: &Store, id: &str, balance: f64) {
        store
            .execute(
                "INSERT INTO accounts (id, name, balance) VALUES (?1, ?2, ?3)",
                params![id, "Checking", balance],
            )
            .unwrap();
    }

    #[test]
    fn test_setup_is_idempotent_and_seeds_once() {
        let store = Store::open_in_memory().unwrap();
        setup_database(store.connection(), false).unwrap();

        let rows = store.fetch_all("SELECT name FROM categories", params![]).unwrap();
        assert_eq!(rows.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_fetch_one_returns_mapping() {
        let store = Store::open_in_memory().unwrap();
        insert_account(&store, "a1", 12.5);

        let row = store
            .fetch_one("SELECT * FROM accounts WHERE id = ?1", params!["a1"])
            .unwrap()
            .unwrap();

        assert_eq!(row.text("id"), Some("a1"));
        assert_eq!(row.text("name"), Some("Checking"));
        assert_eq!(row.real("balance"), Some(12.5));
        assert_eq!(row.real("missing"), None);
    }

    #[test]
    fn test_fetch_one_absent() {
        let store = Store::open_in_memory().unwrap();
        let row = store
            .fetch_one("SELECT * FROM accounts WHERE id = ?1", params!["nope"])
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_null_and_integer_columns() {
        let store = Store::open_in_memory().unwrap();
        let row = store
            .fetch_one("SELECT NULL AS n, 7 AS i, 'x' AS t", params![])
            .unwrap()
            .unwrap();

        assert_eq!(row.get("n"), Some(&Value::Null));
        assert_eq!(row.text("n"), None);
        assert_eq!(row.real("i"), Some(7.0));
        assert_eq!(row.text("t"), Some("x"));
    }

    #[test]
    fn test_integer_lookup() {
        let store = Store::open_in_memory().unwrap();
        let row = store
            .fetch_one(
                "SELECT COUNT(*) AS count, 2.5 AS r, NULL AS n FROM categories",
                params![],
            )
            .unwrap()
            .unwrap();

        assert_eq!(row.integer("count"), Some(DEFAULT_CATEGORIES.len() as i64));
        // REAL values are not silently truncated
        assert_eq!(row.integer("r"), None);
        assert_eq!(row.integer("n"), None);
    }

    #[test]
    fn test_constraint_violation_is_storage_error() {
        let store = Store::open_in_memory().unwrap();
        insert_account(&store, "a1", 0.0);

        let err = store
            .execute(
                "INSERT INTO accounts (id, name, balance) VALUES (?1, ?2, ?3)",
                params!["a1", "Dup", 0.0],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_foreign_key_enforced() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .execute(
                "INSERT INTO transactions (id, account_id, date, amount) VALUES (?1, ?2, ?3, ?4)",
                params!["t1", "ghost", "2024-01-01", 1.0],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_cascade_delete() {
        let store = Store::open_in_memory().unwrap();
        insert_account(&store, "a1", 0.0);
        store
            .execute(
                "INSERT INTO transactions (id, account_id, date, amount) VALUES (?1, ?2, ?3, ?4)",
                params!["t1", "a1", "2024-01-01", 1.0],
            )
            .unwrap();

        store.execute("DELETE FROM accounts WHERE id = ?1", params!["a1"]).unwrap();

        let rows = store.fetch_all("SELECT * FROM transactions", params![]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_atomically_commits() {
        let mut store = Store::open_in_memory().unwrap();

        store
            .atomically(|conn| {
                execute(
                    conn,
                    "INSERT INTO accounts (id, name, balance) VALUES (?1, ?2, ?3)",
                    params!["a1", "Checking", 5.0],
                )?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.fetch_all("SELECT * FROM accounts", params![]).unwrap().len(), 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let mut store = Store::open_in_memory().unwrap();

        let result: Result<()> = store.atomically(|conn| {
            execute(
                conn,
                "INSERT INTO accounts (id, name, balance) VALUES (?1, ?2, ?3)",
                params!["a1", "Checking", 5.0],
            )?;
            Err(LedgerError::not_found("Account", "a2"))
        });

        assert!(result.unwrap_err().is_not_found());
        assert!(store.fetch_all("SELECT * FROM accounts", params![]).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.db");

        {
            let store = Store::open(&path, true).unwrap();
            insert_account(&store, "a1", 1.0);
        }

        let store = Store::open(&path, true).unwrap();
        assert_eq!(store.fetch_all("SELECT * FROM accounts", params![]).unwrap().len(), 1);
        // Reopening does not reseed
        assert_eq!(
            store.fetch_all("SELECT * FROM categories", params![]).unwrap().len(),
            DEFAULT_CATEGORIES.len()
        );
    }
}
