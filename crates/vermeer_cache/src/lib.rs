//! Memoization cache for pipeline stages.
//!
//! Summaries and recommendations are expensive model calls, so stages
//! memoize their results keyed by project. Entries expire after
//! [`vermeer_core::consts::CACHE_TTL`] and losing one is harmless: the
//! stage that misses simply regenerates and repopulates.

mod cache;
mod key;
mod memory;

pub use cache::MemoCache;
pub use key::{hash_key, recommendations_key, summary_key};
pub use memory::InMemoryCache;
