use async_trait::async_trait;
use ephemera_core::AppResult;

/// Store port for rate limit counters.
///
/// Keys are opaque strings. Implementations must provide an atomic
/// increment-and-get so that concurrent increments against one key never
/// lose updates, and must attach the TTL only when the increment creates
/// the key (first-write-wins expiration; see the Redis adapter's script).
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments the counter by one, setting `ttl_seconds` only
    /// if the key did not previously exist. Returns the new count.
    async fn increment(&self, key: &str, ttl_seconds: i64) -> AppResult<i64>;

    /// Returns the current count, or 0 when the key is absent.
    async fn count(&self, key: &str) -> AppResult<i64>;

    /// Returns whether the key is present.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Returns seconds until expiration, or `None` when the key is absent.
    async fn remaining_ttl(&self, key: &str) -> AppResult<Option<i64>>;

    /// Rewrites the TTL without touching the count.
    async fn set_ttl(&self, key: &str, ttl_seconds: i64) -> AppResult<()>;

    /// Deletes the key immediately, independent of TTL.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
