//! Redis-backed custom domain repository.

use async_trait::async_trait;
use ephemera_application::CustomDomainRepository;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::CustomDomain;
use redis::AsyncCommands;

/// Redis implementation of the custom domain repository port.
///
/// Domain records are keyed per customer and hostname; a per-customer set
/// tracks which hostnames exist so listings avoid keyspace scans.
#[derive(Clone)]
pub struct RedisCustomDomainRepository {
    client: redis::Client,
}

impl RedisCustomDomainRepository {
    /// Creates a repository with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key_for(custid: &str, display_domain: &str) -> String {
        format!("customdomain:{custid}:{display_domain}:object")
    }

    fn index_key_for(custid: &str) -> String {
        format!("customer:{custid}:custom_domains")
    }

    async fn connect(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl CustomDomainRepository for RedisCustomDomainRepository {
    async fn save(&self, domain: &CustomDomain) -> AppResult<()> {
        let encoded = serde_json::to_string(domain).map_err(|error| {
            AppError::Internal(format!("failed to encode domain record: {error}"))
        })?;

        let mut connection = self.connect().await?;
        connection
            .set::<_, _, ()>(
                Self::key_for(&domain.custid, &domain.display_domain),
                encoded,
            )
            .await
            .map_err(|error| AppError::Internal(format!("failed to save domain: {error}")))?;
        connection
            .sadd::<_, _, i64>(Self::index_key_for(&domain.custid), &domain.display_domain)
            .await
            .map_err(|error| AppError::Internal(format!("failed to index domain: {error}")))?;
        Ok(())
    }

    async fn load(&self, display_domain: &str, custid: &str) -> AppResult<Option<CustomDomain>> {
        let mut connection = self.connect().await?;
        let encoded: Option<String> = connection
            .get(Self::key_for(custid, display_domain))
            .await
            .map_err(|error| AppError::Internal(format!("failed to load domain: {error}")))?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode domain record: {error}"))
                })
            })
            .transpose()
    }

    async fn list_for_customer(&self, custid: &str) -> AppResult<Vec<CustomDomain>> {
        let mut connection = self.connect().await?;
        let hostnames: Vec<String> = connection
            .smembers(Self::index_key_for(custid))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read domain index: {error}"))
            })?;

        let mut records = Vec::with_capacity(hostnames.len());
        for hostname in hostnames {
            let encoded: Option<String> = connection
                .get(Self::key_for(custid, &hostname))
                .await
                .map_err(|error| AppError::Internal(format!("failed to load domain: {error}")))?;
            if let Some(value) = encoded.as_deref() {
                let record: CustomDomain = serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode domain record: {error}"))
                })?;
                records.push(record);
            }
        }

        records.sort_by_key(|record| record.created);
        Ok(records)
    }

    async fn delete(&self, display_domain: &str, custid: &str) -> AppResult<()> {
        let mut connection = self.connect().await?;
        connection
            .del::<_, i64>(Self::key_for(custid, display_domain))
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete domain: {error}")))?;
        connection
            .srem::<_, _, i64>(Self::index_key_for(custid), display_domain)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to unindex domain: {error}"))
            })?;
        Ok(())
    }
}
