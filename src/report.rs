// 📄 Monthly Report - export payload for one month
//
// Built only from Ledger Service outputs. Rendering (PDF, HTML) is left to
// whatever consumes the payload; this module provides the JSON document and a
// CSV transaction log.

use crate::error::Result;
use crate::ledger::MonthlySummary;
use crate::months::MonthKey;
use crate::entities::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const TRANSACTIONS_HEADER: [&str; 5] = ["Date", "Category", "Note", "Type", "Amount"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: MonthKey,
    pub summary: MonthlySummary,
    /// Expense total per category
    pub categories: BTreeMap<String, f64>,
    /// Newest first
    pub transactions: Vec<Transaction>,
}

/// One row of the category breakdown table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    /// Percentage of the month's categorized expenses (0..=100)
    pub percentage: f64,
}

impl MonthlyReport {
    pub fn new(
        month: MonthKey,
        summary: MonthlySummary,
        categories: BTreeMap<String, f64>,
        transactions: Vec<Transaction>,
    ) -> Self {
        MonthlyReport {
            month,
            summary,
            categories,
            transactions,
        }
    }

    /// Categories by amount, largest first, with their share of the total.
    /// Shares are 0 when there is nothing to divide.
    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        let total: f64 = self.categories.values().sum();

        let mut shares: Vec<CategoryShare> = self
            .categories
            .iter()
            .map(|(category, amount)| CategoryShare {
                category: category.clone(),
                amount: *amount,
                percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
            })
            .collect();

        // Stable sort keeps ties in name order
        shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        shares
    }

    /// One-line overview, e.g. "October 2023: income +2000.00, expenses -450.00, net +1550.00"
    pub fn summary_line(&self) -> String {
        let net = self.summary.net_income;
        format!(
            "{}: income +{:.2}, expenses -{:.2}, net {}{:.2}",
            self.month.label(),
            self.summary.income,
            self.summary.expenses,
            if net >= 0.0 { "+" } else { "-" },
            net.abs()
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        info!(month = %self.month, path = %path.display(), "report written");
        Ok(())
    }

    /// Transaction log as CSV (Date, Category, Note, Type, Amount).
    /// Amounts are signed: expenses carry a leading minus.
    pub fn write_transactions_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        csv.write_record(TRANSACTIONS_HEADER)?;
        for tx in &self.transactions {
            let amount = format!("{:.2}", tx.signed_amount());
            csv.write_record([
                tx.date.as_str(),
                tx.category.as_str(),
                tx.note.as_deref().unwrap_or(""),
                tx.kind.as_str(),
                amount.as_str(),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }
}
