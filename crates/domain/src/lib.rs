//! Domain types and validation rules for Ephemera.

#![forbid(unsafe_code)]

/// Customer accounts and credential validation.
pub mod customer;
/// Custom domains and brand settings.
pub mod custom_domain;
/// Secrets, metadata receipts, and their lifecycle state machine.
pub mod secret;

pub use custom_domain::{BrandPatch, CustomDomain, DisplayDomain};
pub use customer::{ANONYMOUS_CUSTID, Customer, CustomerRole, EmailAddress, validate_passphrase};
pub use secret::{
    METADATA_DEFAULT_TTL_SECONDS, Metadata, SECRET_DEFAULT_TTL_SECONDS, SECRET_MAX_TTL_SECONDS,
    Secret, SecretState,
};
