//! Redis-backed customer repository.

use async_trait::async_trait;
use ephemera_application::CustomerRepository;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::Customer;
use redis::AsyncCommands;

/// Redis implementation of the customer repository port.
///
/// Account records never expire; they are keyed by the canonical email.
#[derive(Clone)]
pub struct RedisCustomerRepository {
    client: redis::Client,
}

impl RedisCustomerRepository {
    /// Creates a repository with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key_for(custid: &str) -> String {
        format!("customer:{custid}:object")
    }

    async fn connect(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl CustomerRepository for RedisCustomerRepository {
    async fn find(&self, custid: &str) -> AppResult<Option<Customer>> {
        let mut connection = self.connect().await?;
        let encoded: Option<String> = connection
            .get(Self::key_for(custid))
            .await
            .map_err(|error| AppError::Internal(format!("failed to load customer: {error}")))?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode customer record: {error}"))
                })
            })
            .transpose()
    }

    async fn exists(&self, custid: &str) -> AppResult<bool> {
        let mut connection = self.connect().await?;
        connection
            .exists(Self::key_for(custid))
            .await
            .map_err(|error| AppError::Internal(format!("failed to check customer: {error}")))
    }

    async fn save(&self, customer: &Customer) -> AppResult<()> {
        let encoded = serde_json::to_string(customer).map_err(|error| {
            AppError::Internal(format!("failed to encode customer record: {error}"))
        })?;

        let mut connection = self.connect().await?;
        connection
            .set::<_, _, ()>(Self::key_for(&customer.custid), encoded)
            .await
            .map_err(|error| AppError::Internal(format!("failed to save customer: {error}")))
    }
}
