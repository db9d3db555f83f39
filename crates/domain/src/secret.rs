//! Secret and metadata records with their lifecycle state machine.
//!
//! A concealed secret produces two records: the `Secret` itself (the payload,
//! addressed by a key shared with the recipient) and a `Metadata` receipt
//! (addressed by a private key known only to the creator). The receipt tracks
//! lifecycle state; the secret payload is deleted the moment it is revealed
//! or burned.

use chrono::{DateTime, Utc};
use ephemera_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::customer::ANONYMOUS_CUSTID;

/// Default metadata receipt retention: 14 days.
pub const METADATA_DEFAULT_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Default secret payload lifetime: 7 days.
pub const SECRET_DEFAULT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on a requested secret lifetime: 30 days.
pub const SECRET_MAX_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Lifecycle state of a metadata receipt.
///
/// `Viewed` means the secret link page was requested (GET) but the secret
/// contents have not been revealed yet; `Received` means the contents were
/// actually delivered. The distinction communicates activity around a secret
/// without implying disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretState {
    /// Freshly concealed, nothing has happened yet.
    New,
    /// The secret link has been loaded but not revealed.
    Viewed,
    /// The secret contents were delivered; the payload is gone.
    Received,
    /// The creator destroyed the secret before it was received.
    Burned,
    /// The metadata outlived its secret payload (manual deletion or expiry).
    Orphaned,
}

impl SecretState {
    /// Returns the storage string for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Viewed => "viewed",
            Self::Received => "received",
            Self::Burned => "burned",
            Self::Orphaned => "orphaned",
        }
    }

    /// Parses a storage string into a state.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "new" => Ok(Self::New),
            "viewed" => Ok(Self::Viewed),
            "received" => Ok(Self::Received),
            "burned" => Ok(Self::Burned),
            "orphaned" => Ok(Self::Orphaned),
            _ => Err(AppError::Validation(format!(
                "unknown secret state '{value}'"
            ))),
        }
    }
}

/// Metadata receipt for a concealed secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Private receipt key, known only to the creator.
    pub key: String,
    /// Owning customer, or `anon`.
    pub custid: String,
    /// Current lifecycle state.
    pub state: SecretState,
    /// Key of the secret payload; cleared once the payload is destroyed.
    pub secret_key: Option<String>,
    /// First 8 characters of the secret key, safe for dashboards.
    pub secret_shortkey: String,
    /// Lifetime requested for the secret payload, in seconds.
    pub secret_ttl: i64,
    /// Custom domain the secret link was shared under, if any.
    pub share_domain: Option<String>,
    /// Obscured recipient addresses, if the link was delivered directly.
    pub recipients: Option<String>,
    /// Epoch at which the link page was first loaded.
    pub viewed: Option<i64>,
    /// Epoch at which the contents were delivered.
    pub received: Option<i64>,
    /// Epoch at which the secret was burned.
    pub burned: Option<i64>,
    /// Creation epoch.
    pub created: i64,
    /// Last update epoch.
    pub updated: i64,
}

impl Metadata {
    /// Creates a fresh receipt in the `New` state.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        custid: impl Into<String>,
        secret_key: &str,
        secret_ttl: i64,
        share_domain: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let epoch = now.timestamp();
        Self {
            key: key.into(),
            custid: custid.into(),
            state: SecretState::New,
            secret_key: Some(secret_key.to_owned()),
            secret_shortkey: secret_key.chars().take(8).collect(),
            secret_ttl,
            share_domain,
            recipients: None,
            viewed: None,
            received: None,
            burned: None,
            created: epoch,
            updated: epoch,
        }
    }

    /// Returns the first 6 characters of the receipt key for log lines.
    #[must_use]
    pub fn shortkey(&self) -> String {
        self.key.chars().take(6).collect()
    }

    /// Returns whether the receipt belongs to the anonymous pseudo-customer.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.custid == ANONYMOUS_CUSTID
    }

    /// Returns whether the given customer owns this receipt. Anonymous
    /// receipts have no owner.
    #[must_use]
    pub fn is_owner(&self, custid: &str) -> bool {
        !self.is_anonymous() && self.custid == custid
    }

    /// Returns whether the secret payload is gone for good.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, SecretState::Received | SecretState::Burned)
    }

    /// Seconds elapsed since the last update.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp() - self.updated
    }

    /// Marks the secret link as viewed.
    ///
    /// Only a `New` receipt can transition; anything else is a no-op so the
    /// state never moves backwards. Returns whether the transition applied.
    pub fn mark_viewed(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != SecretState::New {
            return false;
        }
        self.state = SecretState::Viewed;
        self.viewed = Some(now.timestamp());
        self.updated = now.timestamp();
        true
    }

    /// Marks the secret contents as delivered and clears the secret key.
    ///
    /// Allowed from `New` or `Viewed` only. Returns whether the transition
    /// applied.
    pub fn mark_received(&mut self, now: DateTime<Utc>) -> bool {
        if !matches!(self.state, SecretState::New | SecretState::Viewed) {
            return false;
        }
        self.state = SecretState::Received;
        self.received = Some(now.timestamp());
        self.updated = now.timestamp();
        self.secret_key = None;
        true
    }

    /// Marks the secret as burned by its creator and clears the secret key.
    ///
    /// Allowed from `New` or `Viewed` only. Returns whether the transition
    /// applied.
    pub fn mark_burned(&mut self, now: DateTime<Utc>) -> bool {
        if !matches!(self.state, SecretState::New | SecretState::Viewed) {
            return false;
        }
        self.state = SecretState::Burned;
        self.burned = Some(now.timestamp());
        self.updated = now.timestamp();
        self.secret_key = None;
        true
    }

    /// Marks a receipt whose secret payload disappeared out-of-band.
    ///
    /// A guard prevents touching receipts that already cleared their secret
    /// key (those have a terminal state of their own). Returns whether the
    /// transition applied.
    pub fn mark_orphaned(&mut self, now: DateTime<Utc>) -> bool {
        if self.secret_key.is_none() {
            return false;
        }
        self.state = SecretState::Orphaned;
        self.updated = now.timestamp();
        self.secret_key = None;
        true
    }
}

/// A concealed secret payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    /// Key shared with the recipient.
    pub key: String,
    /// Key of the paired metadata receipt.
    pub metadata_key: String,
    /// Owning customer, or `anon`.
    pub custid: String,
    /// The concealed value.
    pub value: String,
    /// Argon2id hash of the reveal passphrase, if one was set.
    pub passphrase_hash: Option<String>,
    /// Requested lifetime in seconds.
    pub lifetime: i64,
    /// Creation epoch.
    pub created: i64,
}

impl Secret {
    /// Creates a secret payload record.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        metadata_key: impl Into<String>,
        custid: impl Into<String>,
        value: impl Into<String>,
        passphrase_hash: Option<String>,
        lifetime: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            metadata_key: metadata_key.into(),
            custid: custid.into(),
            value: value.into(),
            passphrase_hash,
            lifetime,
            created: now.timestamp(),
        }
    }

    /// Returns whether a passphrase must be supplied to reveal this secret.
    #[must_use]
    pub fn has_passphrase(&self) -> bool {
        self.passphrase_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> Metadata {
        Metadata::new(
            "receipt-key-abc123",
            "alex@example.com",
            "secret-key-def456",
            SECRET_DEFAULT_TTL_SECONDS,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn fresh_metadata_starts_new_with_shortkey() {
        let metadata = sample_metadata();
        assert_eq!(metadata.state, SecretState::New);
        assert_eq!(metadata.secret_shortkey, "secret-k");
        assert!(metadata.secret_key.is_some());
    }

    #[test]
    fn viewed_only_from_new() {
        let mut metadata = sample_metadata();
        assert!(metadata.mark_viewed(Utc::now()));
        assert_eq!(metadata.state, SecretState::Viewed);
        // A second view attempt does not reapply.
        assert!(!metadata.mark_viewed(Utc::now()));
    }

    #[test]
    fn received_clears_secret_key() {
        let mut metadata = sample_metadata();
        assert!(metadata.mark_viewed(Utc::now()));
        assert!(metadata.mark_received(Utc::now()));
        assert_eq!(metadata.state, SecretState::Received);
        assert!(metadata.secret_key.is_none());
        assert!(metadata.is_destroyed());
    }

    #[test]
    fn received_cannot_regress_to_burned() {
        let mut metadata = sample_metadata();
        assert!(metadata.mark_received(Utc::now()));
        assert!(!metadata.mark_burned(Utc::now()));
        assert_eq!(metadata.state, SecretState::Received);
    }

    #[test]
    fn burned_allowed_from_new_or_viewed() {
        let mut fresh = sample_metadata();
        assert!(fresh.mark_burned(Utc::now()));
        assert_eq!(fresh.state, SecretState::Burned);

        let mut viewed = sample_metadata();
        assert!(viewed.mark_viewed(Utc::now()));
        assert!(viewed.mark_burned(Utc::now()));
        assert!(viewed.secret_key.is_none());
    }

    #[test]
    fn orphaned_requires_a_remaining_secret_key() {
        let mut metadata = sample_metadata();
        assert!(metadata.mark_orphaned(Utc::now()));
        assert_eq!(metadata.state, SecretState::Orphaned);
        // Secret key already cleared, guard refuses a second pass.
        assert!(!metadata.mark_orphaned(Utc::now()));
    }

    #[test]
    fn ownership_excludes_anonymous_receipts() {
        let mut metadata = sample_metadata();
        assert!(metadata.is_owner("alex@example.com"));
        assert!(!metadata.is_owner("other@example.com"));

        metadata.custid = ANONYMOUS_CUSTID.to_owned();
        assert!(!metadata.is_owner(ANONYMOUS_CUSTID));
    }

    #[test]
    fn state_round_trips_through_storage_string() {
        for state in [
            SecretState::New,
            SecretState::Viewed,
            SecretState::Received,
            SecretState::Burned,
            SecretState::Orphaned,
        ] {
            assert_eq!(SecretState::parse(state.as_str()).ok(), Some(state));
        }
        assert!(SecretState::parse("bogus").is_err());
    }
}
