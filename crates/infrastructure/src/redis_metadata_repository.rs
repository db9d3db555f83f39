//! Redis-backed metadata receipt repository.

use async_trait::async_trait;
use ephemera_application::MetadataRepository;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::{ANONYMOUS_CUSTID, Metadata};
use redis::AsyncCommands;

/// Upper bound on the per-customer dashboard index.
const INDEX_CAPACITY: isize = 1000;

/// Redis implementation of the metadata repository port.
///
/// Receipts carry their retention TTL in Redis. Each owned receipt is also
/// pushed onto a per-customer list so the dashboard can walk recent activity
/// without scanning the keyspace; anonymous receipts are not indexed.
#[derive(Clone)]
pub struct RedisMetadataRepository {
    client: redis::Client,
}

impl RedisMetadataRepository {
    /// Creates a repository with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key_for(metadata_key: &str) -> String {
        format!("metadata:{metadata_key}:object")
    }

    fn index_key_for(custid: &str) -> String {
        format!("customer:{custid}:metadata")
    }

    async fn connect(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    fn encode(metadata: &Metadata) -> AppResult<String> {
        serde_json::to_string(metadata).map_err(|error| {
            AppError::Internal(format!("failed to encode metadata record: {error}"))
        })
    }
}

#[async_trait]
impl MetadataRepository for RedisMetadataRepository {
    async fn create(&self, metadata: &Metadata, ttl_seconds: i64) -> AppResult<()> {
        let encoded = Self::encode(metadata)?;
        let ttl_seconds = u64::try_from(ttl_seconds)
            .map_err(|error| AppError::Validation(format!("invalid metadata ttl: {error}")))?;

        let mut connection = self.connect().await?;
        connection
            .set_ex::<_, _, ()>(Self::key_for(&metadata.key), encoded, ttl_seconds)
            .await
            .map_err(|error| AppError::Internal(format!("failed to save metadata: {error}")))?;

        if metadata.custid != ANONYMOUS_CUSTID {
            let index_key = Self::index_key_for(&metadata.custid);
            connection
                .lpush::<_, _, i64>(&index_key, &metadata.key)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to index metadata: {error}"))
                })?;
            connection
                .ltrim::<_, ()>(&index_key, 0, INDEX_CAPACITY - 1)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to trim metadata index: {error}"))
                })?;
        }

        Ok(())
    }

    async fn update(&self, metadata: &Metadata) -> AppResult<()> {
        let encoded = Self::encode(metadata)?;
        let mut connection = self.connect().await?;

        // KEEPTTL rewrites the value without touching the expiry, so a state
        // change never extends a receipt's retention.
        redis::cmd("SET")
            .arg(Self::key_for(&metadata.key))
            .arg(encoded)
            .arg("KEEPTTL")
            .query_async::<()>(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to update metadata: {error}")))
    }

    async fn load(&self, key: &str) -> AppResult<Option<Metadata>> {
        let mut connection = self.connect().await?;
        let encoded: Option<String> = connection
            .get(Self::key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to load metadata: {error}")))?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode metadata record: {error}"))
                })
            })
            .transpose()
    }

    async fn recent_for_customer(&self, custid: &str, limit: usize) -> AppResult<Vec<Metadata>> {
        let mut connection = self.connect().await?;
        let upper = isize::try_from(limit)
            .map_err(|error| AppError::Validation(format!("invalid listing limit: {error}")))?;

        let keys: Vec<String> = connection
            .lrange(Self::index_key_for(custid), 0, upper - 1)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read metadata index: {error}"))
            })?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            // Index entries outlive their receipts; skip expired ones.
            let encoded: Option<String> = connection
                .get(Self::key_for(&key))
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to load metadata: {error}"))
                })?;
            if let Some(value) = encoded.as_deref() {
                let record = serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode metadata record: {error}"))
                })?;
                records.push(record);
            }
        }

        Ok(records)
    }
}
