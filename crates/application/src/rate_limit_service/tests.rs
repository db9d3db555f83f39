use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use ephemera_core::{AppError, AppResult};

use super::config::RateLimitEvents;
use super::ports::CounterStore;
use super::service::{RateLimitService, RateLimited};
use super::window::WINDOW_SECONDS;

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: i64,
    ttl_seconds: i64,
}

/// In-memory counter store double. TTLs are recorded, not enforced; tests
/// assert on the recorded values directly.
#[derive(Default)]
struct InMemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl InMemoryCounterStore {
    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, CounterEntry>>> {
        self.entries
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock counter store: {error}")))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, ttl_seconds: i64) -> AppResult<i64> {
        let mut entries = self.lock()?;
        let entry = entries.entry(key.to_owned()).or_insert(CounterEntry {
            count: 0,
            ttl_seconds,
        });
        entry.count += 1;
        Ok(entry.count)
    }

    async fn count(&self, key: &str) -> AppResult<i64> {
        Ok(self.lock()?.get(key).map(|entry| entry.count).unwrap_or(0))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    async fn remaining_ttl(&self, key: &str) -> AppResult<Option<i64>> {
        Ok(self.lock()?.get(key).map(|entry| entry.ttl_seconds))
    }

    async fn set_ttl(&self, key: &str, ttl_seconds: i64) -> AppResult<()> {
        if let Some(entry) = self.lock()?.get_mut(key) {
            entry.ttl_seconds = ttl_seconds;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

fn service_with_events(events: RateLimitEvents) -> RateLimitService {
    RateLimitService::new(Arc::new(InMemoryCounterStore::default()), Arc::new(events))
}

fn test_events() -> RateLimitEvents {
    let mut events = RateLimitEvents::new();
    events.register_event("test_limit", 3);
    events
}

struct TestEntity {
    id: String,
}

impl RateLimited for TestEntity {
    fn external_identifier(&self) -> String {
        format!("test-{}", self.id)
    }
}

#[test]
fn unregistered_events_use_the_default_limit() {
    let events = RateLimitEvents::new();
    assert_eq!(events.event_limit("unknown_event"), 25);
}

#[test]
fn registered_events_use_their_configured_limit() {
    let mut events = RateLimitEvents::new();
    assert_eq!(events.register_event("test_limit", 3), 3);
    assert_eq!(events.event_limit("test_limit"), 3);
}

#[test]
fn bulk_registration_applies_every_pair() {
    let mut events = RateLimitEvents::new();
    events.register_events([("bulk_limit".to_owned(), 5), ("api_limit".to_owned(), 10)]);
    assert_eq!(events.event_limit("bulk_limit"), 5);
    assert_eq!(events.event_limit("api_limit"), 10);
}

#[test]
fn registration_overwrites_an_existing_limit() {
    let mut events = RateLimitEvents::new();
    events.register_event("test_limit", 3);
    events.register_event("test_limit", 7);
    assert_eq!(events.event_limit("test_limit"), 7);
}

#[test]
fn limiter_key_has_the_expected_shape() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("tryouts-abc123", "test_limit");
    assert_eq!(
        limiter.key(),
        format!(
            "limiter:tryouts-abc123:test_limit:{}:counter",
            limiter.window_stamp()
        )
    );
    assert_eq!(limiter.identifier(), "tryouts-abc123");
    assert_eq!(limiter.event(), "test_limit");
    assert_eq!(limiter.limit(), 3);
}

#[tokio::test]
async fn fresh_limiter_has_no_key_and_zero_count() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-fresh", "test_limit");

    assert_eq!(limiter.exists().await.ok(), Some(false));
    assert_eq!(limiter.count().await.ok(), Some(0));
    assert_eq!(limiter.remaining_ttl().await.ok(), Some(None));
}

#[tokio::test]
async fn first_increment_creates_the_key_with_the_window_ttl() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-ttl", "test_limit");

    assert_eq!(limiter.increment().await.ok(), Some(1));
    assert_eq!(limiter.exists().await.ok(), Some(true));
    assert_eq!(limiter.count().await.ok(), Some(1));

    let ttl = limiter.remaining_ttl().await.ok().flatten();
    assert!(matches!(ttl, Some(ttl) if ttl > 1100 && ttl <= WINDOW_SECONDS));
}

#[tokio::test]
async fn later_increments_do_not_extend_the_ttl() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-ttl-fixed", "test_limit");

    assert!(limiter.increment().await.is_ok());
    assert!(limiter.update_expiration(5).await.is_ok());
    assert!(limiter.increment().await.is_ok());

    // The second increment found an existing key and left its TTL alone.
    assert_eq!(limiter.remaining_ttl().await.ok().flatten(), Some(5));
    assert_eq!(limiter.count().await.ok(), Some(2));
}

#[tokio::test]
async fn update_expiration_rewrites_ttl_without_resetting_count() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-expire", "test_limit");

    assert!(limiter.increment().await.is_ok());
    let before = limiter.remaining_ttl().await.ok().flatten();
    assert_eq!(before, Some(WINDOW_SECONDS));

    assert!(limiter.update_expiration(5).await.is_ok());
    assert_eq!(limiter.remaining_ttl().await.ok().flatten(), Some(5));
    assert_eq!(limiter.count().await.ok(), Some(1));
}

#[tokio::test]
async fn exceeding_the_limit_fails_with_the_over_limit_count() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-exceed", "test_limit");

    for _ in 0..3 {
        assert!(limiter.increment().await.is_ok());
    }
    assert_eq!(limiter.exceeded().await.ok(), Some(false));

    let error = limiter.increment().await.err();
    match error {
        Some(AppError::RateLimited {
            event,
            identifier,
            count,
        }) => {
            assert_eq!(event, "test_limit");
            assert_eq!(identifier, "id-exceed");
            assert_eq!(count, 4);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // The over-limit increment was durably applied, not rolled back.
    assert_eq!(limiter.count().await.ok(), Some(4));
    assert_eq!(limiter.exceeded().await.ok(), Some(true));
}

#[tokio::test]
async fn different_events_use_independent_counters() {
    let service = service_with_events(test_events());
    let first = service.limiter("id-shared", "test_limit");
    let second = service.limiter("id-shared", "other_limit");

    assert_ne!(first.key(), second.key());
    assert!(first.increment().await.is_ok());
    assert_eq!(first.count().await.ok(), Some(1));
    assert_eq!(second.count().await.ok(), Some(0));
}

#[tokio::test]
async fn different_identifiers_use_independent_counters() {
    let service = service_with_events(test_events());
    let first = service.limiter("id-one", "test_limit");
    let second = service.limiter("id-two", "test_limit");

    assert_ne!(first.key(), second.key());
    assert!(first.increment().await.is_ok());
    assert_eq!(first.count().await.ok(), Some(1));
    assert_eq!(second.count().await.ok(), Some(0));
}

#[tokio::test]
async fn different_windows_use_independent_counters() {
    let service = service_with_events(test_events());
    let now = Utc::now();
    let current = service.limiter_at("id-window", "test_limit", now);
    let next = service.limiter_at(
        "id-window",
        "test_limit",
        now + TimeDelta::seconds(WINDOW_SECONDS),
    );

    assert_ne!(current.key(), next.key());
    assert!(current.increment().await.is_ok());
    assert_eq!(current.count().await.ok(), Some(1));
    assert_eq!(next.count().await.ok(), Some(0));
}

#[tokio::test]
async fn clear_removes_the_key() {
    let service = service_with_events(test_events());
    let limiter = service.limiter("id-clear", "test_limit");

    assert!(limiter.increment().await.is_ok());
    assert!(limiter.increment().await.is_ok());
    assert!(limiter.clear().await.is_ok());

    assert_eq!(limiter.exists().await.ok(), Some(false));
    assert_eq!(limiter.count().await.ok(), Some(0));
}

#[tokio::test]
async fn enforce_aborts_once_the_threshold_is_crossed() {
    let service = service_with_events(test_events());

    for _ in 0..3 {
        assert!(service.enforce("203.0.113.7", "test_limit").await.is_ok());
    }
    assert!(matches!(
        service.enforce("203.0.113.7", "test_limit").await,
        Err(AppError::RateLimited { .. })
    ));
}

#[tokio::test]
async fn rate_limited_entities_increment_count_and_clear() {
    let service = service_with_events(test_events());
    let entity = TestEntity {
        id: "abc123".to_owned(),
    };

    assert_eq!(service.event_increment(&entity, "test_limit").await.ok(), Some(1));
    assert_eq!(service.event_count(&entity, "test_limit").await.ok(), Some(1));

    assert!(service.event_clear(&entity, "test_limit").await.is_ok());
    assert_eq!(service.event_count(&entity, "test_limit").await.ok(), Some(0));
}

#[tokio::test]
async fn concurrent_increments_never_lose_updates() {
    let service = service_with_events({
        let mut events = RateLimitEvents::new();
        events.register_event("burst_limit", 1000);
        events
    });

    // Pin the window so every task addresses the same counter even if the
    // wall clock crosses a boundary mid-test.
    let now = Utc::now();
    let mut join_set = tokio::task::JoinSet::new();
    for _ in 0..64 {
        let limiter = service.limiter_at("id-concurrent", "burst_limit", now);
        join_set.spawn(async move { limiter.increment().await });
    }

    let mut successes = 0;
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(_)) => successes += 1,
            other => panic!("increment task failed: {other:?}"),
        }
    }

    assert_eq!(successes, 64);
    let limiter = service.limiter_at("id-concurrent", "burst_limit", now);
    assert_eq!(limiter.count().await.ok(), Some(64));
}
