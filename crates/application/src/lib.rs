//! Application services and ports for Ephemera.

#![forbid(unsafe_code)]

mod custom_domain_service;
mod customer_service;
mod keygen;
mod rate_limit_service;
mod secret_service;

pub use custom_domain_service::{CustomDomainRepository, CustomDomainService};
pub use customer_service::{
    CreateAccountParams, CustomerRepository, CustomerService, PassphraseHasher,
};
pub use rate_limit_service::{
    CounterStore, DEFAULT_EVENT_LIMIT, Limiter, RateLimitEvents, RateLimitService, RateLimited,
    WINDOW_SECONDS, window_stamp,
};
pub use secret_service::{
    ConcealParams, ConcealedPair, MetadataRepository, SecretRepository, SecretService,
};
