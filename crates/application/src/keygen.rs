//! Entropy-derived identifiers for secrets and metadata receipts.

use ephemera_core::{AppError, AppResult};

/// Length of generated secret and metadata keys.
const KEY_LENGTH: usize = 31;

/// Generates a 31-character lowercase hex key from fresh entropy.
///
/// The entropy is hashed before encoding so the key reveals nothing about
/// the generator state.
pub(crate) fn generate_key() -> AppResult<String> {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate key entropy: {error}")))?;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();

    let mut key = digest
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });
    key.truncate(KEY_LENGTH);

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_have_the_expected_length_and_alphabet() {
        let key = generate_key().unwrap_or_default();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn consecutive_keys_differ() {
        let first = generate_key().unwrap_or_default();
        let second = generate_key().unwrap_or_default();
        assert_ne!(first, second);
    }
}
