use crate::{ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Plan {
    /// The tier every account starts on.
    #[default]
    Personal,
}

/// A user's credit account.
///
/// `credit_balance` is the single source of truth for spendable credits.
/// It only changes together with an appended [`CreditTransaction`], so the
/// ledger can always be replayed to the current balance.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Subscription {
    #[builder(default = "Uuid::new_v4()")]
    id: Uuid,
    user_id: UserId,
    #[builder(default)]
    plan: Plan,
    /// Spendable credits. Never negative.
    #[builder(default)]
    credit_balance: i64,
    #[builder(default = "Utc::now()")]
    created_at: DateTime<Utc>,
    #[builder(default = "Utc::now()")]
    updated_at: DateTime<Utc>,
}

impl Subscription {
    /// True when at least `amount` credits are available.
    pub fn can_afford(&self, amount: i64) -> bool {
        self.credit_balance >= amount
    }

    /// Returns a copy with the given balance, with a fresh modification
    /// time. The caller is responsible for appending the matching ledger
    /// entry.
    pub fn with_balance(mut self, balance: i64) -> Self {
        self.credit_balance = balance;
        self.updated_at = Utc::now();
        self
    }
}

/// An immutable ledger entry recording one balance change.
///
/// `amount` is positive for grants and negative for charges; `balance` is
/// the subscription balance immediately after the entry was applied.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct CreditTransaction {
    #[builder(default = "Uuid::new_v4()")]
    id: Uuid,
    subscription_id: Uuid,
    /// Signed credit delta.
    amount: i64,
    /// Balance after applying this entry.
    balance: i64,
    /// Human-readable cause, e.g. "Image 7f3a... created".
    reason: String,
    /// Product that was purchased, for grant entries tied to an order.
    #[builder(default)]
    product_id: Option<ProductId>,
    /// Deduplication key. At most one entry exists per key, which keeps
    /// redelivered jobs and replayed webhooks from double-applying.
    #[builder(default)]
    correlation_id: Option<String>,
    #[builder(default = "Utc::now()")]
    created_at: DateTime<Utc>,
}

impl CreditTransaction {
    pub fn is_charge(&self) -> bool {
        self.amount < 0
    }

    pub fn is_grant(&self) -> bool {
        self.amount > 0
    }
}

/// A purchasable credit pack.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Product {
    #[builder(default)]
    id: ProductId,
    /// Identifier assigned by the payment processor.
    external_id: String,
    name: String,
    /// Credits granted when an order for this product lands.
    credit_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_afford_compares_balance() {
        let sub = SubscriptionBuilder::default()
            .user_id("user_1")
            .credit_balance(2i64)
            .build()
            .unwrap();
        assert!(sub.can_afford(1));
        assert!(sub.can_afford(2));
        assert!(!sub.can_afford(3));
    }

    #[test]
    fn transaction_sign_classifies_entry() {
        let sub_id = Uuid::new_v4();
        let charge = CreditTransactionBuilder::default()
            .subscription_id(sub_id)
            .amount(-1i64)
            .balance(4i64)
            .reason("Image 123 created")
            .build()
            .unwrap();
        assert!(charge.is_charge());
        assert!(!charge.is_grant());

        let grant = CreditTransactionBuilder::default()
            .subscription_id(sub_id)
            .amount(25i64)
            .balance(29i64)
            .reason("Order 456")
            .build()
            .unwrap();
        assert!(grant.is_grant());
    }
}
