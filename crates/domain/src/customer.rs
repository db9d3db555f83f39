//! Customer domain types and validation rules.

use std::str::FromStr;

use ephemera_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Customer identifier reserved for unauthenticated visitors. Anonymous
/// customers are never persisted.
pub const ANONYMOUS_CUSTID: &str = "anon";

/// Minimum passphrase length for new accounts.
pub const PASSPHRASE_MIN_LENGTH: usize = 6;

/// Maximum passphrase length (protects against Argon2id DoS).
pub const PASSPHRASE_MAX_LENGTH: usize = 128;

/// Validated email address. Doubles as the customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Validates a plaintext passphrase for account creation or change.
pub fn validate_passphrase(passphrase: &str) -> AppResult<()> {
    let char_count = passphrase.chars().count();

    if char_count < PASSPHRASE_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "passphrase must be at least {PASSPHRASE_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSPHRASE_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "passphrase must not exceed {PASSPHRASE_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Role assigned to a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerRole {
    /// Regular paying or free-tier customer.
    Customer,
    /// Site operator with administrative access.
    Colonel,
}

impl CustomerRole {
    /// Returns the storage string for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Colonel => "colonel",
        }
    }
}

impl FromStr for CustomerRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "colonel" => Ok(Self::Colonel),
            _ => Err(AppError::Validation(format!(
                "unknown customer role '{value}'"
            ))),
        }
    }
}

/// A customer account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Canonical email address, used as the record identifier.
    pub custid: String,
    /// Assigned role.
    pub role: CustomerRole,
    /// Subscription plan identifier.
    pub planid: String,
    /// Whether the email address has been verified.
    pub verified: bool,
    /// Argon2id passphrase hash.
    pub passphrase_hash: String,
    /// Number of secrets this customer has concealed.
    pub secrets_created: i64,
    /// Creation time as a UTC epoch.
    pub created: i64,
    /// Last update time as a UTC epoch.
    pub updated: i64,
}

impl Customer {
    /// Creates a new customer record in its initial state.
    #[must_use]
    pub fn new(
        email: EmailAddress,
        passphrase_hash: impl Into<String>,
        role: CustomerRole,
        planid: impl Into<String>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let epoch = now.timestamp();
        Self {
            custid: email.into(),
            role,
            planid: planid.into(),
            verified: false,
            passphrase_hash: passphrase_hash.into(),
            secrets_created: 0,
            created: epoch,
            updated: epoch,
        }
    }

    /// Returns whether this is the anonymous pseudo-customer.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.custid == ANONYMOUS_CUSTID
    }

    /// Obscures the email address for log output, e.g. `jo*****@example.com`.
    #[must_use]
    pub fn obscured_email(&self) -> String {
        obscure_email(&self.custid)
    }
}

/// Obscures an email address for log output.
#[must_use]
pub fn obscure_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}*****@{domain}")
        }
        None => "*****".to_owned(),
    }
}
