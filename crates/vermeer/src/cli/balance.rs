//! Balance command handler.

use anyhow::Context;
use vermeer_core::UserId;
use vermeer_store::{CreditLedger, PgStore};

/// Handles the `balance` command: prints a subscription's balance and its
/// most recent ledger entries.
pub async fn handle_balance_command(user: String, limit: usize) -> anyhow::Result<()> {
    let store = PgStore::from_env().context("connecting to Postgres via DATABASE_URL")?;
    let user = UserId::from(user);
    let Some(subscription) = store.subscription(&user).await? else {
        println!("no subscription for {user}");
        std::process::exit(1);
    };

    println!("{user}: {} credits", subscription.credit_balance());
    let transactions = store.transactions(&user).await?;
    for entry in transactions.iter().take(limit) {
        println!(
            "  {}  {:+4} -> {:4}  {}",
            entry.created_at().format("%Y-%m-%d %H:%M"),
            entry.amount(),
            entry.balance(),
            entry.reason()
        );
    }
    Ok(())
}
