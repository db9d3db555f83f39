use std::sync::Arc;

use chrono::{DateTime, Utc};
use ephemera_core::{AppError, AppResult};

use super::ports::CounterStore;
use super::window::{WINDOW_SECONDS, window_stamp};

/// The countable unit: one counter addressing a (subject identifier, event,
/// window) triple.
///
/// The window stamp is fixed at construction, so a limiter instance always
/// addresses the window that was active when it was built.
#[derive(Clone)]
pub struct Limiter {
    identifier: String,
    event: String,
    window_stamp: String,
    limit: u32,
    store: Arc<dyn CounterStore>,
}

impl Limiter {
    pub(super) fn new(
        store: Arc<dyn CounterStore>,
        identifier: impl Into<String>,
        event: impl Into<String>,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            event: event.into(),
            window_stamp: window_stamp(now),
            limit,
            store,
        }
    }

    /// The subject identifier this limiter is scoped to.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// The throttled event name.
    #[must_use]
    pub fn event(&self) -> &str {
        self.event.as_str()
    }

    /// The window stamp fixed at construction.
    #[must_use]
    pub fn window_stamp(&self) -> &str {
        self.window_stamp.as_str()
    }

    /// The threshold resolved from the event registry at construction.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The full counter store key for this limiter.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "limiter:{}:{}:{}:counter",
            self.identifier, self.event, self.window_stamp
        )
    }

    /// Atomically increments the counter, creating it with the window TTL on
    /// first write. Returns the new count.
    ///
    /// When the new count exceeds the event limit this fails with
    /// `AppError::RateLimited`; the increment is durably applied before the
    /// error is raised, so the counter reflects the over-limit value.
    pub async fn increment(&self) -> AppResult<i64> {
        let count = self.store.increment(&self.key(), WINDOW_SECONDS).await?;

        if count > i64::from(self.limit) {
            return Err(AppError::RateLimited {
                event: self.event.clone(),
                identifier: self.identifier.clone(),
                count,
            });
        }

        Ok(count)
    }

    /// Current counter value, or 0 when the key does not exist. Non-mutating.
    pub async fn count(&self) -> AppResult<i64> {
        self.store.count(&self.key()).await
    }

    /// Whether the current count is over the event limit.
    pub async fn exceeded(&self) -> AppResult<bool> {
        Ok(self.count().await? > i64::from(self.limit))
    }

    /// Whether the underlying counter key is present.
    pub async fn exists(&self) -> AppResult<bool> {
        self.store.exists(&self.key()).await
    }

    /// Seconds until the counter expires, or `None` when absent.
    pub async fn remaining_ttl(&self) -> AppResult<Option<i64>> {
        self.store.remaining_ttl(&self.key()).await
    }

    /// Explicitly rewrites the TTL. Administrative paths only; the normal
    /// increment flow never extends expiration.
    pub async fn update_expiration(&self, ttl_seconds: i64) -> AppResult<()> {
        self.store.set_ttl(&self.key(), ttl_seconds).await
    }

    /// Deletes the counter immediately, independent of TTL.
    pub async fn clear(&self) -> AppResult<()> {
        self.store.delete(&self.key()).await
    }
}
