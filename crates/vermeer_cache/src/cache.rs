use std::time::Duration;
use vermeer_error::CacheResult;

/// A string-to-string cache with per-entry expiry.
///
/// Every operation is fallible so that backends with real I/O can report
/// their errors; the in-memory backend never fails in practice.
#[async_trait::async_trait]
pub trait MemoCache: Send + Sync {
    /// Looks up a live entry. Expired entries read as absent.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value that expires after `ttl`. Overwrites any existing
    /// entry and resets its expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes an entry if present.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}
