use std::sync::Arc;

use chrono::{DateTime, Utc};
use ephemera_core::{AppResult, SessionIdentity};
use ephemera_domain::Customer;

use super::config::RateLimitEvents;
use super::limiter::Limiter;
use super::ports::CounterStore;

/// Capability for entities that can be rate-limited per instance, such as a
/// customer accumulating failed passphrase attempts.
pub trait RateLimited: Sync {
    /// Stable identifier used as the limiter's subject.
    fn external_identifier(&self) -> String;
}

impl RateLimited for Customer {
    fn external_identifier(&self) -> String {
        self.custid.clone()
    }
}

impl RateLimited for SessionIdentity {
    fn external_identifier(&self) -> String {
        self.custid().to_owned()
    }
}

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn CounterStore>,
    events: Arc<RateLimitEvents>,
}

impl RateLimitService {
    /// Creates a rate limit service over a counter store and the event
    /// registry built at boot.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, events: Arc<RateLimitEvents>) -> Self {
        Self { store, events }
    }

    /// Builds a limiter for the window active right now.
    #[must_use]
    pub fn limiter(&self, identifier: &str, event: &str) -> Limiter {
        self.limiter_at(identifier, event, Utc::now())
    }

    /// Builds a limiter for the window active at `now`. The event limit is
    /// resolved from the registry here; unregistered events fall back to the
    /// default.
    #[must_use]
    pub fn limiter_at(&self, identifier: &str, event: &str, now: DateTime<Utc>) -> Limiter {
        Limiter::new(
            self.store.clone(),
            identifier,
            event,
            self.events.event_limit(event),
            now,
        )
    }

    /// The action-level guard: counts one occurrence of `event` for the
    /// subject and fails with `AppError::RateLimited` once over the limit.
    ///
    /// Call this at the start of a use case, before any side effect, so a
    /// throttled request aborts without committing partial state.
    pub async fn enforce(&self, identifier: &str, event: &str) -> AppResult<i64> {
        self.limiter(identifier, event).increment().await
    }

    /// Counts one event occurrence for a rate-limited entity.
    pub async fn event_increment(&self, entity: &dyn RateLimited, event: &str) -> AppResult<i64> {
        self.limiter(&entity.external_identifier(), event)
            .increment()
            .await
    }

    /// Current count of an event for a rate-limited entity.
    pub async fn event_count(&self, entity: &dyn RateLimited, event: &str) -> AppResult<i64> {
        self.limiter(&entity.external_identifier(), event)
            .count()
            .await
    }

    /// Clears the current window's counter for a rate-limited entity.
    pub async fn event_clear(&self, entity: &dyn RateLimited, event: &str) -> AppResult<()> {
        self.limiter(&entity.external_identifier(), event)
            .clear()
            .await
    }
}
