//! Secret lifecycle ports and application service.
//!
//! A concealed secret is a pair of records: the payload (shared key) and its
//! metadata receipt (private key). The receipt survives the payload and
//! tracks the lifecycle state; the payload is deleted the moment it is
//! revealed or burned. Every entry point runs its rate limit guard first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::{
    DisplayDomain, METADATA_DEFAULT_TTL_SECONDS, Metadata, SECRET_DEFAULT_TTL_SECONDS,
    SECRET_MAX_TTL_SECONDS, Secret,
};

use crate::customer_service::PassphraseHasher;
use crate::keygen::generate_key;
use crate::rate_limit_service::RateLimitService;

pub(crate) const CONCEAL_SECRET_EVENT: &str = "conceal_secret";
pub(crate) const SHOW_SECRET_EVENT: &str = "show_secret";
pub(crate) const BURN_SECRET_EVENT: &str = "burn_secret";
pub(crate) const SHOW_METADATA_EVENT: &str = "show_metadata";

/// Shortest accepted secret lifetime.
const SECRET_MIN_TTL_SECONDS: i64 = 60;

/// Dashboard listing size.
const RECENT_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for secret payload persistence.
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Persists a new payload with the given TTL.
    async fn create(&self, secret: &Secret, ttl_seconds: i64) -> AppResult<()>;

    /// Loads a payload by key.
    async fn load(&self, key: &str) -> AppResult<Option<Secret>>;

    /// Deletes a payload immediately.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Repository port for metadata receipt persistence.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Persists a new receipt with the given TTL and indexes it for the
    /// owning customer's dashboard.
    async fn create(&self, metadata: &Metadata, ttl_seconds: i64) -> AppResult<()>;

    /// Rewrites an existing receipt without touching its expiration, so a
    /// state change never extends the record's lifetime.
    async fn update(&self, metadata: &Metadata) -> AppResult<()>;

    /// Loads a receipt by key.
    async fn load(&self, key: &str) -> AppResult<Option<Metadata>>;

    /// Most recent receipts for a customer, newest first.
    async fn recent_for_customer(&self, custid: &str, limit: usize) -> AppResult<Vec<Metadata>>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Parameters for concealing a secret.
#[derive(Debug, Clone, Default)]
pub struct ConcealParams {
    /// The value to conceal.
    pub value: String,
    /// Optional reveal passphrase.
    pub passphrase: Option<String>,
    /// Requested payload lifetime; clamped to the allowed range.
    pub ttl_seconds: Option<i64>,
    /// Custom domain the link will be shared under.
    pub share_domain: Option<String>,
}

/// The two records produced by a conceal operation.
#[derive(Debug, Clone)]
pub struct ConcealedPair {
    /// The private receipt, for the creator.
    pub metadata: Metadata,
    /// The payload record, addressed by the shareable key.
    pub secret: Secret,
}

/// Application service for the secret lifecycle.
#[derive(Clone)]
pub struct SecretService {
    secret_repository: Arc<dyn SecretRepository>,
    metadata_repository: Arc<dyn MetadataRepository>,
    passphrase_hasher: Arc<dyn PassphraseHasher>,
    rate_limits: RateLimitService,
    default_secret_ttl: i64,
    metadata_ttl: i64,
}

impl SecretService {
    /// Creates a secret service with the configured retention defaults.
    #[must_use]
    pub fn new(
        secret_repository: Arc<dyn SecretRepository>,
        metadata_repository: Arc<dyn MetadataRepository>,
        passphrase_hasher: Arc<dyn PassphraseHasher>,
        rate_limits: RateLimitService,
        default_secret_ttl: Option<i64>,
        metadata_ttl: Option<i64>,
    ) -> Self {
        Self {
            secret_repository,
            metadata_repository,
            passphrase_hasher,
            rate_limits,
            default_secret_ttl: default_secret_ttl.unwrap_or(SECRET_DEFAULT_TTL_SECONDS),
            metadata_ttl: metadata_ttl.unwrap_or(METADATA_DEFAULT_TTL_SECONDS),
        }
    }

    /// Conceals a value: creates the payload and its metadata receipt.
    pub async fn conceal(
        &self,
        subject_identifier: &str,
        custid: &str,
        params: ConcealParams,
    ) -> AppResult<ConcealedPair> {
        self.rate_limits
            .enforce(subject_identifier, CONCEAL_SECRET_EVENT)
            .await?;

        if params.value.is_empty() {
            return Err(AppError::Validation(
                "you did not provide anything to share".to_owned(),
            ));
        }

        let share_domain = params
            .share_domain
            .filter(|value| !value.trim().is_empty())
            .map(DisplayDomain::new)
            .transpose()?
            .map(String::from);

        let ttl_seconds = params
            .ttl_seconds
            .unwrap_or(self.default_secret_ttl)
            .clamp(SECRET_MIN_TTL_SECONDS, SECRET_MAX_TTL_SECONDS);

        let passphrase_hash = params
            .passphrase
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| self.passphrase_hasher.hash_passphrase(value))
            .transpose()?;

        let secret_key = generate_key()?;
        let metadata_key = generate_key()?;
        let now = Utc::now();

        let secret = Secret::new(
            secret_key.as_str(),
            metadata_key.as_str(),
            custid,
            params.value,
            passphrase_hash,
            ttl_seconds,
            now,
        );
        let metadata = Metadata::new(
            metadata_key.as_str(),
            custid,
            secret_key.as_str(),
            ttl_seconds,
            share_domain,
            now,
        );

        self.secret_repository.create(&secret, ttl_seconds).await?;
        self.metadata_repository
            .create(&metadata, self.metadata_ttl)
            .await?;

        Ok(ConcealedPair { metadata, secret })
    }

    /// Loads a metadata receipt by its private key. The key itself is the
    /// capability; no ownership check is applied.
    pub async fn metadata(
        &self,
        subject_identifier: &str,
        metadata_key: &str,
    ) -> AppResult<Metadata> {
        self.rate_limits
            .enforce(subject_identifier, SHOW_METADATA_EVENT)
            .await?;

        self.metadata_repository
            .load(metadata_key)
            .await?
            .ok_or_else(|| AppError::NotFound("unknown metadata".to_owned()))
    }

    /// Records that the secret link page was loaded, moving a fresh receipt
    /// to `Viewed`. Returns `Some(has_passphrase)` while the secret exists so
    /// the link page knows whether to prompt, `None` once it is gone.
    pub async fn link_viewed(&self, secret_key: &str) -> AppResult<Option<bool>> {
        let Some(secret) = self.secret_repository.load(secret_key).await? else {
            return Ok(None);
        };

        if let Some(mut metadata) = self.metadata_repository.load(&secret.metadata_key).await?
            && metadata.mark_viewed(Utc::now())
        {
            self.metadata_repository.update(&metadata).await?;
        }

        Ok(Some(secret.has_passphrase()))
    }

    /// Reveals a secret: verifies the passphrase when one is set, destroys
    /// the payload, and marks the receipt received.
    pub async fn reveal(
        &self,
        subject_identifier: &str,
        secret_key: &str,
        passphrase: Option<&str>,
    ) -> AppResult<Secret> {
        self.rate_limits
            .enforce(subject_identifier, SHOW_SECRET_EVENT)
            .await?;

        let secret = self
            .secret_repository
            .load(secret_key)
            .await?
            .ok_or_else(|| AppError::NotFound("unknown secret".to_owned()))?;

        if let Some(hash) = secret.passphrase_hash.as_deref() {
            let supplied = passphrase.unwrap_or_default();
            if !self.passphrase_hasher.verify_passphrase(supplied, hash)? {
                return Err(AppError::Forbidden("incorrect passphrase".to_owned()));
            }
        }

        self.secret_repository.delete(secret_key).await?;

        if let Some(mut metadata) = self.metadata_repository.load(&secret.metadata_key).await?
            && metadata.mark_received(Utc::now())
        {
            self.metadata_repository.update(&metadata).await?;
        }

        Ok(secret)
    }

    /// Burns a secret from its metadata receipt: destroys the payload
    /// without revealing it and marks the receipt burned.
    ///
    /// Owned receipts are only burnable by their owner; anonymous receipts
    /// are burnable by anyone holding the private key.
    pub async fn burn(
        &self,
        subject_identifier: &str,
        custid: &str,
        metadata_key: &str,
    ) -> AppResult<Metadata> {
        self.rate_limits
            .enforce(subject_identifier, BURN_SECRET_EVENT)
            .await?;

        let mut metadata = self
            .metadata_repository
            .load(metadata_key)
            .await?
            .ok_or_else(|| AppError::NotFound("unknown metadata".to_owned()))?;

        if !metadata.is_anonymous() && !metadata.is_owner(custid) {
            return Err(AppError::Forbidden(
                "only the creator can burn this secret".to_owned(),
            ));
        }

        if metadata.is_destroyed() {
            return Err(AppError::Conflict(
                "this secret has already been destroyed".to_owned(),
            ));
        }

        let now = Utc::now();
        match metadata.secret_key.clone() {
            Some(secret_key) => {
                let secret_existed = self.secret_repository.load(&secret_key).await?.is_some();
                if secret_existed {
                    self.secret_repository.delete(&secret_key).await?;
                    metadata.mark_burned(now);
                } else {
                    // Payload already gone out-of-band (manual delete or
                    // expiry); record the receipt as orphaned instead.
                    metadata.mark_orphaned(now);
                }
            }
            None => {
                metadata.mark_orphaned(now);
            }
        }

        self.metadata_repository.update(&metadata).await?;
        Ok(metadata)
    }

    /// Recent receipts for a customer's dashboard, newest first.
    pub async fn recent(&self, subject_identifier: &str, custid: &str) -> AppResult<Vec<Metadata>> {
        self.rate_limits
            .enforce(subject_identifier, SHOW_METADATA_EVENT)
            .await?;

        self.metadata_repository
            .recent_for_customer(custid, RECENT_LIMIT)
            .await
    }
}
