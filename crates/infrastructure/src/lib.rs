//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_passphrase_hasher;
mod redis_counter_store;
mod redis_custom_domain_repository;
mod redis_customer_repository;
mod redis_metadata_repository;
mod redis_secret_repository;

pub use argon2_passphrase_hasher::Argon2PassphraseHasher;
pub use redis_counter_store::RedisCounterStore;
pub use redis_custom_domain_repository::RedisCustomDomainRepository;
pub use redis_customer_repository::RedisCustomerRepository;
pub use redis_metadata_repository::RedisMetadataRepository;
pub use redis_secret_repository::RedisSecretRepository;
