//! Redis-backed rate limit counter store.

use async_trait::async_trait;
use ephemera_application::CounterStore;
use ephemera_core::{AppError, AppResult};
use redis::{AsyncCommands, Script};

/// Increments the counter and stamps the window TTL only when the key is
/// created. A pre-existing key keeps its original expiry, so the window
/// closes relative to the first event in it.
const INCREMENT_SCRIPT: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])

local count = redis.call('INCR', key)
local ttl = redis.call('TTL', key)

if ttl < 0 then
  redis.call('EXPIRE', key, window)
end

return count
"#;

/// Redis implementation of the rate limit counter store port.
#[derive(Clone)]
pub struct RedisCounterStore {
    client: redis::Client,
}

impl RedisCounterStore {
    /// Creates a counter store with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connect(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, ttl_seconds: i64) -> AppResult<i64> {
        if ttl_seconds <= 0 {
            return Err(AppError::Validation(
                "counter ttl_seconds must be greater than zero".to_owned(),
            ));
        }

        let mut connection = self.connect().await?;

        let script = Script::new(INCREMENT_SCRIPT);
        script
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to increment redis counter: {error}"))
            })
    }

    async fn count(&self, key: &str) -> AppResult<i64> {
        let mut connection = self.connect().await?;
        let count: Option<i64> = connection
            .get(key)
            .await
            .map_err(|error| AppError::Internal(format!("failed to read redis counter: {error}")))?;
        Ok(count.unwrap_or(0))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut connection = self.connect().await?;
        connection.exists(key).await.map_err(|error| {
            AppError::Internal(format!("failed to check redis counter: {error}"))
        })
    }

    async fn remaining_ttl(&self, key: &str) -> AppResult<Option<i64>> {
        let mut connection = self.connect().await?;
        let ttl: i64 = connection
            .ttl(key)
            .await
            .map_err(|error| AppError::Internal(format!("failed to read redis ttl: {error}")))?;
        // Negative replies mean the key is missing or has no expiry.
        Ok((ttl >= 0).then_some(ttl))
    }

    async fn set_ttl(&self, key: &str, ttl_seconds: i64) -> AppResult<()> {
        let mut connection = self.connect().await?;
        connection
            .expire::<_, bool>(key, ttl_seconds)
            .await
            .map_err(|error| AppError::Internal(format!("failed to set redis ttl: {error}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connect().await?;
        connection
            .del::<_, i64>(key)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete redis counter: {error}"))
            })?;
        Ok(())
    }
}
