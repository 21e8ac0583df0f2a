// Budget Ledger - command line front end
//
// Usage: budget-ledger <command> [args...]
// The database comes from BUDGET_LEDGER_DB / BUDGET_LEDGER_CONFIG (see config).

use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::path::Path;

use budget_ledger::entities::transaction::parse_date;
use budget_ledger::{
    init_tracing, Ledger, LedgerConfig, MonthKey, TransactionDraft, TransactionFilter,
    TransactionType,
};

const USAGE: &str = "\
Usage: budget-ledger <command> [args...]

Commands:
  accounts                                      List accounts
  add-account NAME BALANCE                      Create an account
  edit-account ID NAME BALANCE                  Rename / correct balance
  delete-account ID                             Delete an account and its transactions
  add-tx ACCOUNT DATE AMOUNT TYPE CATEGORY [NOTE]
                                                Record Income/Expense (DATE = YYYY-MM-DD)
  edit-tx ID ACCOUNT DATE AMOUNT TYPE CATEGORY [NOTE]
                                                Overwrite a transaction
  delete-tx ID                                  Delete a transaction
  transactions [ACCOUNT] [YYYY-MM]              List transactions, newest first
  summary [YYYY-MM]                             Net worth and month totals
  categories                                    Known categories
  months                                        Calendar months
  report YYYY-MM [OUT.json] [OUT.csv]           Monthly report";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config = LedgerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_filter);

    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mut ledger = Ledger::open(&config)
        .with_context(|| format!("Failed to open ledger at {:?}", config.database_path))?;

    run(&mut ledger, command, &args[1..])
}

fn run(ledger: &mut Ledger, command: &str, args: &[String]) -> Result<()> {
    match command {
        "accounts" => list_accounts(ledger),
        "add-account" => {
            let [name, balance] = expect_args::<2>(command, args)?;
            let account = ledger.add_account(name, parse_amount(balance)?)?;
            println!("✓ Account created: {} ({})", account.name, account.id);
            Ok(())
        }
        "edit-account" => {
            let [id, name, balance] = expect_args::<3>(command, args)?;
            ledger.update_account(id, name, parse_amount(balance)?)?;
            println!("✓ Account updated: {}", id);
            Ok(())
        }
        "delete-account" => {
            let [id] = expect_args::<1>(command, args)?;
            ledger.delete_account(id)?;
            println!("✓ Account deleted: {}", id);
            Ok(())
        }
        "add-tx" => {
            let draft = parse_draft(command, args)?;
            let tx = ledger.add_transaction(draft)?;
            println!("✓ Transaction recorded: {} {} {:.2} on {}", tx.id, tx.kind, tx.amount, tx.date);
            Ok(())
        }
        "edit-tx" => {
            let Some((id, fields)) = args.split_first() else {
                bail!("'edit-tx' needs a transaction id\n\n{}", USAGE);
            };
            let tx = ledger.update_transaction(id, parse_draft(command, fields)?)?;
            println!("✓ Transaction updated: {} {} {:.2} on {}", tx.id, tx.kind, tx.amount, tx.date);
            Ok(())
        }
        "delete-tx" => {
            let [id] = expect_args::<1>(command, args)?;
            let removed = ledger.delete_transaction(id)?;
            println!("✓ Transaction deleted: {} ({} {:.2})", removed.id, removed.kind, removed.amount);
            Ok(())
        }
        "transactions" => list_transactions(ledger, &parse_filter(args)?),
        "summary" => {
            let month = args.first().map(|m| m.parse::<MonthKey>()).transpose()?;
            show_summary(ledger, month)
        }
        "categories" => {
            for name in ledger.get_unique_categories()? {
                println!("  • {}", name);
            }
            Ok(())
        }
        "months" => {
            for entry in ledger.calendar_months()? {
                println!("  {}  {}", entry.key, entry.label);
            }
            Ok(())
        }
        "report" => export_report(ledger, args),
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn expect_args<'a, const N: usize>(command: &str, args: &'a [String]) -> Result<[&'a str; N]> {
    if args.len() != N {
        bail!("'{}' takes {} argument(s), got {}\n\n{}", command, N, args.len(), USAGE);
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

fn parse_amount(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("'{}' is not a number", raw))
}

fn list_accounts(ledger: &Ledger) -> Result<()> {
    let accounts = ledger.get_accounts()?;
    if accounts.is_empty() {
        println!("No accounts yet. Create one with: budget-ledger add-account NAME BALANCE");
        return Ok(());
    }

    println!("💳 Accounts");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for account in &accounts {
        let marker = if account.is_overdrawn() { "⚠️ " } else { "" };
        println!("{}{:<24} {:>12.2}  {}", marker, account.name, account.balance, account.id);
    }
    Ok(())
}

/// ACCOUNT DATE AMOUNT TYPE CATEGORY [NOTE]
fn parse_draft(command: &str, fields: &[String]) -> Result<TransactionDraft> {
    if !(5..=6).contains(&fields.len()) {
        bail!("'{}' expects ACCOUNT DATE AMOUNT TYPE CATEGORY [NOTE], got {} field(s)\n\n{}", command, fields.len(), USAGE);
    }

    let date = parse_date(&fields[1])?;
    let amount = parse_amount(&fields[2])?;
    let kind: TransactionType = fields[3].parse()?;

    let mut draft = TransactionDraft::new(&fields[0], date, amount, kind).with_category(&fields[4]);
    if let Some(note) = fields.get(5) {
        draft = draft.with_note(note);
    }
    Ok(draft)
}

/// `[ACCOUNT] [YYYY-MM]` in either order; a `YYYY-MM` argument is the month
fn parse_filter(args: &[String]) -> Result<TransactionFilter> {
    if args.len() > 2 {
        bail!("'transactions' takes at most 2 arguments\n\n{}", USAGE);
    }

    let mut filter = TransactionFilter::all();
    for arg in args {
        match arg.parse::<MonthKey>() {
            Ok(month) if filter.month.is_none() => filter.month = Some(month),
            _ if filter.account_id.is_none() => filter.account_id = Some(arg.clone()),
            _ => bail!("'transactions' got two values for the same filter: {:?}", args),
        }
    }
    Ok(filter)
}

fn list_transactions(ledger: &Ledger, filter: &TransactionFilter) -> Result<()> {
    let transactions = ledger.get_transactions(filter)?;
    println!("📋 {} transaction(s)", transactions.len());

    for tx in &transactions {
        println!(
            "{}  {:>+10.2}  {:<14} {}  [{}]",
            tx.date,
            tx.signed_amount(),
            tx.category,
            tx.note.as_deref().unwrap_or(""),
            tx.id
        );
    }
    Ok(())
}

fn show_summary(ledger: &Ledger, month: Option<MonthKey>) -> Result<()> {
    let month = month.unwrap_or_else(MonthKey::current);
    let summary = ledger.get_monthly_summary(Some(month))?;

    println!("📊 {}", month.label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Net worth:   {:>12.2}", summary.net_worth);
    println!("Income:      {:>12.2}", summary.income);
    println!("Expenses:    {:>12.2}", summary.expenses);
    println!("Net income:  {:>+12.2}", summary.net_income);

    let spending = ledger.get_category_spending(month)?;
    if !spending.is_empty() {
        println!("\nSpending by category:");
        for (category, amount) in &spending {
            println!("  {:<16} {:>10.2}", category, amount);
        }
    }
    Ok(())
}

fn export_report(ledger: &Ledger, args: &[String]) -> Result<()> {
    let Some(month) = args.first() else {
        bail!("'report' needs a month (YYYY-MM)\n\n{}", USAGE);
    };
    let report = ledger.monthly_report(month.parse()?)?;

    println!("{}", report.summary_line());
    for share in report.category_breakdown() {
        println!("  {:<16} {:>10.2}  {:>5.1}%", share.category, share.amount, share.percentage);
    }

    if let Some(json_path) = args.get(1) {
        report.write_json(Path::new(json_path))?;
        println!("✓ JSON written to {}", json_path);
    }
    if let Some(csv_path) = args.get(2) {
        let file = File::create(csv_path).with_context(|| format!("Failed to create {}", csv_path))?;
        report.write_transactions_csv(file)?;
        println!("✓ CSV written to {}", csv_path);
    }
    Ok(())
}
