//! Argon2id adapter behind the application's `PassphraseHasher` port.
//!
//! Passphrases guard two things here: customer accounts and individual
//! secrets. Both are hashed identically and stored as PHC strings, so a
//! stored hash self-describes its parameters and older hashes keep
//! verifying after a parameter bump.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use ephemera_application::PassphraseHasher as PassphraseHasherPort;
use ephemera_core::{AppError, AppResult};

// OWASP Password Storage baseline for Argon2id.
const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const LANES: u32 = 1;

/// Argon2id hasher for account and secret passphrases.
#[derive(Clone)]
pub struct Argon2PassphraseHasher {
    argon2: Argon2<'static>,
}

impl Argon2PassphraseHasher {
    /// Creates a hasher with the baseline cost parameters.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, LANES, None).unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PassphraseHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseHasherPort for Argon2PassphraseHasher {
    fn hash_passphrase(&self, passphrase: &str) -> AppResult<String> {
        // An empty passphrase means "no passphrase" everywhere in the app;
        // hashing one would silently turn it into a real credential.
        if passphrase.is_empty() {
            return Err(AppError::Validation(
                "passphrase must not be empty".to_owned(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(passphrase.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash passphrase: {error}")))?;

        Ok(hash.to_string())
    }

    fn verify_passphrase(&self, passphrase: &str, hash: &str) -> AppResult<bool> {
        // A stored hash that no longer parses is corrupted credential data,
        // not a wrong passphrase.
        let parsed_hash = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored passphrase hash is unreadable: {error}"))
        })?;

        match self
            .argon2
            .verify_password(passphrase.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "passphrase verification failed: {error}"
            ))),
        }
    }
}
