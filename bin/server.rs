// Budget Ledger - Web Server
// JSON API over the ledger (routes live in `budget_ledger::api`)

use anyhow::{Context, Result};
use budget_ledger::{api, init_tracing, Ledger, LedgerConfig};
use tracing::info;

/// Bind address, overridable with BUDGET_LEDGER_ADDR
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<()> {
    let config = LedgerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_filter);

    let ledger = Ledger::open(&config)
        .with_context(|| format!("Failed to open ledger at {:?}", config.database_path))?;
    info!(path = ?config.database_path, "database opened");

    let app = api::router(ledger);

    let addr = std::env::var("BUDGET_LEDGER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/accounts", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;
    Ok(())
}
