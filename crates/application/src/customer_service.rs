//! Customer account ports and application service.
//!
//! Owns account creation and session authentication. Every mutating entry
//! point runs its rate limit guard before any other work, so a throttled
//! request aborts without partial state. Failure messages are generic to
//! avoid account enumeration.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::{Customer, CustomerRole, EmailAddress, validate_passphrase};

use crate::rate_limit_service::RateLimitService;

/// Event counted once per account creation attempt.
pub(crate) const CREATE_ACCOUNT_EVENT: &str = "create_account";

/// Event counted once per login attempt from a subject.
pub(crate) const AUTHENTICATE_EVENT: &str = "authenticate_session";

/// Event counted per customer on wrong-passphrase logins.
pub(crate) const FAILED_PASSPHRASE_EVENT: &str = "failed_passphrase";

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for customer persistence.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Loads a customer by identifier (canonical email).
    async fn find(&self, custid: &str) -> AppResult<Option<Customer>>;

    /// Returns whether a customer record exists.
    async fn exists(&self, custid: &str) -> AppResult<bool>;

    /// Persists the full customer record.
    async fn save(&self, customer: &Customer) -> AppResult<()>;
}

/// Port for passphrase hashing. Keeps services free of direct cryptographic
/// library coupling.
pub trait PassphraseHasher: Send + Sync {
    /// Hashes a plaintext passphrase using Argon2id.
    fn hash_passphrase(&self, passphrase: &str) -> AppResult<String>;

    /// Verifies a plaintext passphrase against a stored hash.
    fn verify_passphrase(&self, passphrase: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Parameters for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    /// Requested email address; becomes the customer identifier.
    pub email: String,
    /// Plaintext passphrase.
    pub passphrase: String,
    /// Requested plan, defaults to `basic` when unknown or absent.
    pub planid: Option<String>,
}

/// Application service for customer accounts.
#[derive(Clone)]
pub struct CustomerService {
    customer_repository: Arc<dyn CustomerRepository>,
    passphrase_hasher: Arc<dyn PassphraseHasher>,
    rate_limits: RateLimitService,
    colonels: Vec<String>,
}

impl CustomerService {
    /// Creates a customer service. `colonels` lists the email addresses that
    /// receive the operator role at signup.
    #[must_use]
    pub fn new(
        customer_repository: Arc<dyn CustomerRepository>,
        passphrase_hasher: Arc<dyn PassphraseHasher>,
        rate_limits: RateLimitService,
        colonels: Vec<String>,
    ) -> Self {
        Self {
            customer_repository,
            passphrase_hasher,
            rate_limits,
            colonels,
        }
    }

    /// Creates a new customer account.
    ///
    /// `subject_identifier` scopes the rate limit guard; the API layer passes
    /// the client IP for unauthenticated signups.
    pub async fn create_account(
        &self,
        subject_identifier: &str,
        params: CreateAccountParams,
    ) -> AppResult<Customer> {
        self.rate_limits
            .enforce(subject_identifier, CREATE_ACCOUNT_EVENT)
            .await?;

        let email = EmailAddress::new(&params.email)?;
        validate_passphrase(&params.passphrase)?;

        if self.customer_repository.exists(email.as_str()).await? {
            // Still hash to prevent timing side-channels.
            let _ = self.passphrase_hasher.hash_passphrase(&params.passphrase);
            return Err(AppError::Conflict(
                "please try another email address".to_owned(),
            ));
        }

        let role = if self.colonels.iter().any(|c| c == email.as_str()) {
            CustomerRole::Colonel
        } else {
            CustomerRole::Customer
        };

        let planid = params
            .planid
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "basic".to_owned());

        let passphrase_hash = self.passphrase_hasher.hash_passphrase(&params.passphrase)?;
        let customer = Customer::new(email, passphrase_hash, role, planid, Utc::now());
        self.customer_repository.save(&customer).await?;

        Ok(customer)
    }

    /// Authenticates a customer by email and passphrase.
    ///
    /// Wrong-passphrase attempts are additionally counted against the
    /// customer record itself, so a distributed guessing attack trips the
    /// per-account limit even when each source IP stays under its own.
    pub async fn authenticate(
        &self,
        subject_identifier: &str,
        email: &str,
        passphrase: &str,
    ) -> AppResult<Customer> {
        self.rate_limits
            .enforce(subject_identifier, AUTHENTICATE_EVENT)
            .await?;

        let generic_failure =
            || AppError::Unauthorized("invalid email address or passphrase".to_owned());

        let email = EmailAddress::new(email).map_err(|_| generic_failure())?;

        let Some(customer) = self.customer_repository.find(email.as_str()).await? else {
            // Hash anyway so unknown accounts cost the same as known ones.
            let _ = self.passphrase_hasher.hash_passphrase(passphrase);
            return Err(generic_failure());
        };

        let verified = self
            .passphrase_hasher
            .verify_passphrase(passphrase, &customer.passphrase_hash)?;

        if !verified {
            self.rate_limits
                .event_increment(&customer, FAILED_PASSPHRASE_EVENT)
                .await?;
            return Err(generic_failure());
        }

        self.rate_limits
            .event_clear(&customer, FAILED_PASSPHRASE_EVENT)
            .await?;

        Ok(customer)
    }
}
