//! Credits command handler.

use anyhow::Context;
use vermeer_core::UserId;
use vermeer_store::{CreditLedger, PgStore};

/// Handles the `credits` command: applies a manual ledger adjustment.
///
/// Creates the subscription (with trial credits) if the user has never
/// been seen before. A zero amount is rejected by the ledger.
pub async fn handle_credits_command(
    user: String,
    amount: i64,
    reason: String,
) -> anyhow::Result<()> {
    let store = PgStore::from_env().context("connecting to Postgres via DATABASE_URL")?;
    let user = UserId::from(user);
    store.ensure_subscription(&user).await?;
    let entry = if amount >= 0 {
        store.credit(&user, amount, &reason, None, None).await?
    } else {
        store.debit(&user, -amount, &reason, None).await?
    };
    println!("{user}: {} credits", entry.balance());
    Ok(())
}
