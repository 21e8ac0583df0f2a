// ⚖️ Ledger Service - keeps account balances consistent with their history
//
// Invariant, at every point observable between calls:
//
//   account.balance == opening balance + Σ signed(transaction.amount)
//
// except after an explicit `update_account`, which is the manual balance
// correction and may set any balance.
//
// Every operation that touches both tables (add/update/delete transaction)
// runs inside one `Store::atomically` scope, so a failure part-way rolls the
// whole operation back.

use crate::config::LedgerConfig;
use crate::db::{self, RecordExt, Store};
use crate::entities::{
    new_id, Account, Category, Transaction, TransactionDraft, DEFAULT_CATEGORIES,
};
use crate::entities::transaction::DATE_FORMAT;
use crate::error::{LedgerError, Result};
use crate::months::{month_range, MonthEntry, MonthKey};
use crate::report::MonthlyReport;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, ToSql};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

// ============================================================================
// QUERY RESULTS
// ============================================================================

/// Dashboard totals for one month
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Sum of every account's current balance (not month-scoped)
    pub net_worth: f64,
    pub income: f64,
    pub expenses: f64,
    /// `income - expenses`
    pub net_income: f64,
}

/// Calendar cell markers for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayActivity {
    pub has_income: bool,
    pub has_expense: bool,
}

/// Optional, independently combinable filters for `get_transactions`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub month: Option<MonthKey>,
}

impl TransactionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(account_id: impl Into<String>) -> Self {
        TransactionFilter {
            account_id: Some(account_id.into()),
            month: None,
        }
    }

    pub fn in_month(month: MonthKey) -> Self {
        TransactionFilter {
            account_id: None,
            month: Some(month),
        }
    }

    /// Builder pattern: also restrict to `month`
    pub fn with_month(mut self, month: MonthKey) -> Self {
        self.month = Some(month);
        self
    }
}

// ============================================================================
// LEDGER
// ============================================================================

pub struct Ledger {
    store: Store,
    months_ahead: u32,
}

impl Ledger {
    /// Open the store named by `config`
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        let store = Store::open(&config.database_path, config.wal)?;
        Ok(Self::from_store(store, config.months_ahead))
    }

    /// Private in-memory ledger with default settings
    pub fn open_in_memory() -> Result<Self> {
        let store = Store::open_in_memory()?;
        Ok(Self::from_store(store, LedgerConfig::default().months_ahead))
    }

    pub fn from_store(store: Store, months_ahead: u32) -> Self {
        Ledger {
            store,
            months_ahead,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    pub fn add_account(&mut self, name: &str, initial_balance: f64) -> Result<Account> {
        if !initial_balance.is_finite() {
            return Err(LedgerError::Validation(format!(
                "initial balance must be a number, got {}",
                initial_balance
            )));
        }

        let account = Account::new(name, initial_balance);
        self.store.execute(
            "INSERT INTO accounts (id, name, balance) VALUES (?1, ?2, ?3)",
            params![account.id, account.name, account.balance],
        )?;

        info!(account_id = %account.id, name = %account.name, balance = account.balance, "account added");
        Ok(account)
    }

    /// Overwrite name and balance.
    ///
    /// This is the manual balance correction: transactions are not touched,
    /// so the new balance need not match the transaction history.
    pub fn update_account(&mut self, id: &str, name: &str, balance: f64) -> Result<()> {
        if !balance.is_finite() {
            return Err(LedgerError::Validation(format!(
                "balance must be a number, got {}",
                balance
            )));
        }

        let changed = self.store.execute(
            "UPDATE accounts SET name = ?1, balance = ?2 WHERE id = ?3",
            params![name, balance, id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("Account", id));
        }

        info!(account_id = id, name, balance, "account updated");
        Ok(())
    }

    /// Delete an account; its transactions are removed by the cascade
    pub fn delete_account(&mut self, id: &str) -> Result<()> {
        let removed = self.store.atomically(|conn| {
            let count = db::fetch_one(
                conn,
                "SELECT COUNT(*) AS count FROM transactions WHERE account_id = ?1",
                params![id],
            )?
            .and_then(|row| row.integer("count"))
            .unwrap_or(0);

            let changed = db::execute(conn, "DELETE FROM accounts WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(LedgerError::not_found("Account", id));
            }
            Ok(count)
        })?;

        info!(account_id = id, transactions = removed, "account deleted");
        Ok(())
    }

    /// Accounts in insertion order
    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let rows = self
            .store
            .fetch_all("SELECT id, name, balance FROM accounts ORDER BY rowid", params![])?;
        Ok(rows.iter().map(Account::from_record).collect())
    }

    pub fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let row = self.store.fetch_one(
            "SELECT id, name, balance FROM accounts WHERE id = ?1",
            params![id],
        )?;
        Ok(row.as_ref().map(Account::from_record))
    }

    /// Signed sum of every transaction recorded against `account_id`
    pub fn account_activity(&self, account_id: &str) -> Result<f64> {
        let row = self.store.fetch_one(
            "SELECT COALESCE(SUM(CASE WHEN type = 'Income' THEN amount ELSE -amount END), 0.0) AS net
             FROM transactions
             WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(row.and_then(|r| r.real("net")).unwrap_or(0.0))
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    /// Record a transaction and apply its delta to the account
    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Result<Transaction> {
        draft.validate()?;
        let tx = draft.into_transaction(new_id());

        self.store.atomically(|conn| {
            require_account(conn, &tx.account_id)?;
            insert_transaction(conn, &tx)?;
            adjust_balance(conn, &tx.account_id, tx.signed_amount())
        })?;

        info!(
            transaction_id = %tx.id,
            account_id = %tx.account_id,
            kind = %tx.kind,
            amount = tx.amount,
            "transaction added"
        );
        Ok(tx)
    }

    /// Overwrite every field of transaction `id`.
    ///
    /// The old delta is reverted on the old account and the new delta applied
    /// on the new account. When the account changes these are two separate
    /// single-account adjustments, not a transfer.
    pub fn update_transaction(&mut self, id: &str, draft: TransactionDraft) -> Result<Transaction> {
        draft.validate()?;
        let updated = draft.into_transaction(id.to_string());

        let previous = self.store.atomically(|conn| {
            let previous = find_transaction(conn, id)?
                .ok_or_else(|| LedgerError::not_found("Transaction", id))?;
            require_account(conn, &updated.account_id)?;

            db::execute(
                conn,
                "UPDATE transactions
                 SET account_id = ?1, date = ?2, amount = ?3, category = ?4, type = ?5, note = ?6
                 WHERE id = ?7",
                params![
                    updated.account_id,
                    updated.date,
                    updated.amount,
                    updated.category,
                    updated.kind.as_str(),
                    updated.note,
                    id,
                ],
            )?;

            adjust_balance(conn, &previous.account_id, -previous.signed_amount())?;
            adjust_balance(conn, &updated.account_id, updated.signed_amount())?;
            Ok(previous)
        })?;

        info!(
            transaction_id = id,
            from_account = %previous.account_id,
            to_account = %updated.account_id,
            reverted = -previous.signed_amount(),
            applied = updated.signed_amount(),
            "transaction updated"
        );
        Ok(updated)
    }

    /// Remove transaction `id` and revert its delta
    pub fn delete_transaction(&mut self, id: &str) -> Result<Transaction> {
        let removed = self.store.atomically(|conn| {
            let existing = find_transaction(conn, id)?
                .ok_or_else(|| LedgerError::not_found("Transaction", id))?;

            db::execute(conn, "DELETE FROM transactions WHERE id = ?1", params![id])?;
            adjust_balance(conn, &existing.account_id, -existing.signed_amount())?;
            Ok(existing)
        })?;

        info!(transaction_id = id, account_id = %removed.account_id, "transaction deleted");
        Ok(removed)
    }

    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        find_transaction(self.store.connection(), id)
    }

    /// Transactions matching `filter`, newest date first
    pub fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(account_id) = &filter.account_id {
            values.push(account_id.clone());
            clauses.push(format!("account_id = ?{}", values.len()));
        }
        if let Some(month) = &filter.month {
            values.push(month.like_pattern());
            clauses.push(format!("date LIKE ?{}", values.len()));
        }

        let mut sql = String::from("SELECT * FROM transactions");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC");

        let args: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        let rows = self.store.fetch_all(&sql, &args)?;

        debug!(count = rows.len(), ?filter, "transactions loaded");
        Ok(rows.iter().map(Transaction::from_record).collect())
    }

    // ========================================================================
    // AGGREGATES
    // ========================================================================

    /// Totals for `month` (the current calendar month when `None`)
    pub fn get_monthly_summary(&self, month: Option<MonthKey>) -> Result<MonthlySummary> {
        let month = month.unwrap_or_else(MonthKey::current);

        let net_worth = self
            .store
            .fetch_one("SELECT COALESCE(SUM(balance), 0.0) AS total FROM accounts", params![])?
            .and_then(|row| row.real("total"))
            .unwrap_or(0.0);

        let totals = self.store.fetch_one(
            "SELECT
                COALESCE(SUM(CASE WHEN type = 'Income' THEN amount END), 0.0) AS income,
                COALESCE(SUM(CASE WHEN type = 'Income' THEN NULL ELSE amount END), 0.0) AS expenses
             FROM transactions
             WHERE date LIKE ?1",
            params![month.like_pattern()],
        )?;

        let income = totals.as_ref().and_then(|r| r.real("income")).unwrap_or(0.0);
        let expenses = totals.as_ref().and_then(|r| r.real("expenses")).unwrap_or(0.0);

        Ok(MonthlySummary {
            net_worth,
            income,
            expenses,
            net_income: income - expenses,
        })
    }

    /// Expense totals per category for `month`
    pub fn get_category_spending(&self, month: MonthKey) -> Result<BTreeMap<String, f64>> {
        let rows = self.store.fetch_all(
            "SELECT COALESCE(category, '') AS category, SUM(amount) AS total
             FROM transactions
             WHERE COALESCE(type, '') != 'Income' AND date LIKE ?1
             GROUP BY COALESCE(category, '')",
            params![month.like_pattern()],
        )?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.text("category").unwrap_or_default().to_string(),
                    row.real("total").unwrap_or(0.0),
                )
            })
            .collect())
    }

    /// Which days of `month` have income and/or expense activity
    pub fn get_daily_transaction_summary(
        &self,
        month: MonthKey,
    ) -> Result<BTreeMap<u32, DayActivity>> {
        let rows = self.store.fetch_all(
            "SELECT date, type FROM transactions WHERE date LIKE ?1",
            params![month.like_pattern()],
        )?;

        let mut days: BTreeMap<u32, DayActivity> = BTreeMap::new();
        for tx in rows.iter().map(Transaction::from_record) {
            let Some(day) = tx.day_of_month() else {
                warn!(date = %tx.date, "skipping transaction with unparseable date");
                continue;
            };

            let activity = days.entry(day).or_default();
            if tx.is_income() {
                activity.has_income = true;
            } else {
                activity.has_expense = true;
            }
        }

        Ok(days)
    }

    /// (earliest transaction date, today); earliest is today when the
    /// ledger has no transactions
    pub fn get_transaction_date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let today = Local::now().date_naive();
        let earliest = self.earliest_transaction_date()?.unwrap_or(today);
        Ok((earliest, today))
    }

    fn earliest_transaction_date(&self) -> Result<Option<NaiveDate>> {
        // Zero-padded ISO strings: lexicographic MIN is the chronological MIN
        let row = self
            .store
            .fetch_one("SELECT MIN(date) AS earliest FROM transactions", params![])?;

        let Some(raw) = row.as_ref().and_then(|r| r.text("earliest")) else {
            return Ok(None);
        };

        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                warn!(date = raw, "earliest transaction date is not YYYY-MM-DD");
                Ok(None)
            }
        }
    }

    /// Month tabs for the calendar: earliest transaction month through the
    /// configured number of months past the current one
    pub fn calendar_months(&self) -> Result<Vec<MonthEntry>> {
        let (earliest, today) = self.get_transaction_date_range()?;
        Ok(month_range(earliest, today, self.months_ahead))
    }

    /// Everything the document exporter needs for `month`
    pub fn monthly_report(&self, month: MonthKey) -> Result<MonthlyReport> {
        let summary = self.get_monthly_summary(Some(month))?;
        let categories = self.get_category_spending(month)?;
        let transactions = self.get_transactions(&TransactionFilter::in_month(month))?;
        Ok(MonthlyReport::new(month, summary, categories, transactions))
    }

    // ========================================================================
    // CATEGORIES
    // ========================================================================

    /// Sorted union of the defaults, the catalog, and every non-empty
    /// category used by a transaction
    pub fn get_unique_categories(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> =
            DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect();

        for category in self.get_categories()? {
            names.insert(category.name);
        }

        let used = self.store.fetch_all(
            "SELECT DISTINCT category FROM transactions
             WHERE category IS NOT NULL AND category != ''",
            params![],
        )?;
        names.extend(
            used.iter()
                .filter_map(|row| row.text("category"))
                .map(str::to_string),
        );

        Ok(names.into_iter().collect())
    }

    /// Catalog entries, by name
    pub fn get_categories(&self) -> Result<Vec<Category>> {
        let rows = self
            .store
            .fetch_all("SELECT id, name FROM categories ORDER BY name", params![])?;
        Ok(rows.iter().map(Category::from_record).collect())
    }

    /// Add `name` to the catalog; an existing entry is returned unchanged
    pub fn add_category(&mut self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("category name is empty".to_string()));
        }

        let candidate = Category::new(name);
        let inserted = self.store.execute(
            "INSERT OR IGNORE INTO categories (id, name) VALUES (?1, ?2)",
            params![candidate.id, candidate.name],
        )?;
        if inserted > 0 {
            info!(name, "category added");
            return Ok(candidate);
        }

        self.store
            .fetch_one("SELECT id, name FROM categories WHERE name = ?1", params![name])?
            .as_ref()
            .map(Category::from_record)
            .ok_or_else(|| LedgerError::not_found("Category", name))
    }
}

// ============================================================================
// STATEMENT HELPERS (run on the caller's connection / open transaction)
// ============================================================================

fn require_account(conn: &Connection, account_id: &str) -> Result<()> {
    db::fetch_one(conn, "SELECT id FROM accounts WHERE id = ?1", params![account_id])?
        .map(|_| ())
        .ok_or_else(|| LedgerError::not_found("Account", account_id))
}

fn find_transaction(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    let row = db::fetch_one(conn, "SELECT * FROM transactions WHERE id = ?1", params![id])?;
    Ok(row.as_ref().map(Transaction::from_record))
}

fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    db::execute(
        conn,
        "INSERT INTO transactions (id, account_id, date, amount, category, type, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tx.id,
            tx.account_id,
            tx.date,
            tx.amount,
            tx.category,
            tx.kind.as_str(),
            tx.note,
        ],
    )?;
    Ok(())
}

/// Add `delta` to the stored balance in a single statement
fn adjust_balance(conn: &Connection, account_id: &str, delta: f64) -> Result<()> {
    let changed = db::execute(
        conn,
        "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
        params![delta, account_id],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found("Account", account_id));
    }

    debug!(account_id, delta, "balance adjusted");
    Ok(())
}
