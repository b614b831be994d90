//! Credit ledger trait.

use async_trait::async_trait;
use vermeer_core::{CreditTransaction, Product, ProductId, Subscription, UserId};
use vermeer_error::LedgerResult;

/// Credit accounting for subscriptions.
///
/// Every balance change appends an immutable [`CreditTransaction`] carrying
/// the balance after the change, so the history replays to the current
/// balance. Debits are conditional: they succeed only when the full amount
/// is available, and the check and decrement happen atomically so
/// concurrent spends cannot drive a balance negative.
///
/// `correlation_id` deduplicates adjustments. When a debit or credit names
/// a correlation id that already has an entry, the existing entry comes
/// back and nothing is applied twice. Redelivered jobs and replayed
/// webhooks lean on this.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Returns the user's subscription, creating one with trial credits
    /// when none exists yet.
    async fn ensure_subscription(&self, user: &UserId) -> LedgerResult<Subscription>;

    async fn subscription(&self, user: &UserId) -> LedgerResult<Option<Subscription>>;

    /// Current spendable balance.
    ///
    /// # Errors
    ///
    /// [`LedgerErrorKind::SubscriptionNotFound`](vermeer_error::LedgerErrorKind::SubscriptionNotFound)
    /// when the user has no subscription.
    async fn balance(&self, user: &UserId) -> LedgerResult<i64>;

    /// Atomically removes `amount` credits, appending the charge entry.
    ///
    /// `amount` is the positive number of credits to remove.
    ///
    /// # Errors
    ///
    /// - [`LedgerErrorKind::InvalidAmount`](vermeer_error::LedgerErrorKind::InvalidAmount)
    ///   when `amount` is not positive.
    /// - [`LedgerErrorKind::SubscriptionNotFound`](vermeer_error::LedgerErrorKind::SubscriptionNotFound)
    ///   when the user has no subscription.
    /// - [`LedgerErrorKind::InsufficientFunds`](vermeer_error::LedgerErrorKind::InsufficientFunds)
    ///   when the balance cannot cover the amount. The balance is untouched.
    async fn debit(
        &self,
        user: &UserId,
        amount: i64,
        reason: &str,
        correlation_id: Option<&str>,
    ) -> LedgerResult<CreditTransaction>;

    /// Adds `amount` credits, appending the grant entry.
    ///
    /// `amount` is the positive number of credits to add. `product_id`
    /// links purchase grants to the product bought.
    async fn credit(
        &self,
        user: &UserId,
        amount: i64,
        reason: &str,
        product_id: Option<ProductId>,
        correlation_id: Option<&str>,
    ) -> LedgerResult<CreditTransaction>;

    /// Ledger entries for the user, newest first.
    async fn transactions(&self, user: &UserId) -> LedgerResult<Vec<CreditTransaction>>;

    async fn insert_product(&self, product: &Product) -> LedgerResult<()>;

    /// Looks up a credit pack by the payment processor's identifier.
    async fn product_by_external_id(&self, external_id: &str) -> LedgerResult<Option<Product>>;
}
