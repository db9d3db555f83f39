//! Redis-backed secret payload repository.

use async_trait::async_trait;
use ephemera_application::SecretRepository;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::Secret;
use redis::AsyncCommands;

/// Redis implementation of the secret repository port.
///
/// Payloads carry their TTL in Redis, so an unrevealed secret disappears on
/// its own without any sweeper process.
#[derive(Clone)]
pub struct RedisSecretRepository {
    client: redis::Client,
}

impl RedisSecretRepository {
    /// Creates a repository with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key_for(secret_key: &str) -> String {
        format!("secret:{secret_key}:object")
    }

    async fn connect(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl SecretRepository for RedisSecretRepository {
    async fn create(&self, secret: &Secret, ttl_seconds: i64) -> AppResult<()> {
        let encoded = serde_json::to_string(secret).map_err(|error| {
            AppError::Internal(format!("failed to encode secret record: {error}"))
        })?;
        let ttl_seconds = u64::try_from(ttl_seconds)
            .map_err(|error| AppError::Validation(format!("invalid secret ttl: {error}")))?;

        let mut connection = self.connect().await?;
        connection
            .set_ex::<_, _, ()>(Self::key_for(&secret.key), encoded, ttl_seconds)
            .await
            .map_err(|error| AppError::Internal(format!("failed to save secret: {error}")))
    }

    async fn load(&self, key: &str) -> AppResult<Option<Secret>> {
        let mut connection = self.connect().await?;
        let encoded: Option<String> = connection
            .get(Self::key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to load secret: {error}")))?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode secret record: {error}"))
                })
            })
            .transpose()
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connect().await?;
        connection
            .del::<_, i64>(Self::key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete secret: {error}")))?;
        Ok(())
    }
}
