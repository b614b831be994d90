//! Relational persistence for pipeline entities and the credit ledger.
//!
//! Two traits cover everything the pipeline stores: [`PipelineStore`] for
//! projects, art styles, templates, and image records, and [`CreditLedger`]
//! for subscriptions and their transaction history. [`PgStore`] implements
//! both over PostgreSQL through Diesel; [`MemoryStore`] implements both
//! over hash maps for tests and local development.

mod connection;
mod ledger;
mod memory;
mod models;
mod pg;
pub mod schema;
mod store;

pub use connection::{
    MIGRATIONS, PgPool, create_pool, establish_connection, run_migrations,
};
pub use ledger::CreditLedger;
pub use memory::MemoryStore;
pub use models::{
    ArtStyleRow, CreditTransactionRow, ImageRow, ProductRow, ProjectRow, SubscriptionRow,
    TemplateRow,
};
pub use pg::PgStore;
pub use store::PipelineStore;

pub use vermeer_error::{LedgerResult, StoreResult};
