//! Custom domains and brand settings.
//!
//! Brand values are stored as a flat string map (everything in the key-value
//! store is a string); the allow-list and per-key validation below are the
//! single source of truth for what a brand may contain.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ephemera_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Brand setting keys accepted from clients. Anything else is dropped.
pub const BRAND_SETTING_KEYS: &[&str] = &[
    "logo",
    "primary_color",
    "instructions_pre_reveal",
    "instructions_reveal",
    "instructions_post_reveal",
    "button_text_light",
    "font_family",
    "corner_style",
    "allow_public_homepage",
    "allow_public_api",
];

const FONT_FAMILIES: &[&str] = &["sans-serif", "serif", "monospace"];
const CORNER_STYLES: &[&str] = &["rounded", "square", "pill"];

/// A validated, lowercased hostname for a customer-branded domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayDomain(String);

impl DisplayDomain {
    /// Creates a validated display domain.
    ///
    /// Structural validation only: lowercased, 4-253 characters, at least one
    /// dot, labels of alphanumerics and hyphens that neither start nor end
    /// with a hyphen.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.len() < 4 || trimmed.len() > 253 {
            return Err(AppError::Validation(
                "domain must be between 4 and 253 characters".to_owned(),
            ));
        }

        if !trimmed.contains('.') {
            return Err(AppError::Validation(
                "domain must contain at least one '.'".to_owned(),
            ));
        }

        for label in trimmed.split('.') {
            if label.is_empty() || label.len() > 63 {
                return Err(AppError::Validation(format!(
                    "invalid domain label length in '{trimmed}'"
                )));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(AppError::Validation(format!(
                    "domain label must not start or end with '-' in '{trimmed}'"
                )));
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(AppError::Validation(format!(
                    "domain contains invalid characters: '{trimmed}'"
                )));
            }
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated hostname.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayDomain> for String {
    fn from(value: DisplayDomain) -> Self {
        value.0
    }
}

/// Requested brand changes: `None` removes a key, `Some` overwrites it.
pub type BrandPatch = BTreeMap<String, Option<String>>;

/// A customer-owned custom domain with brand settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDomain {
    /// The branded hostname.
    pub display_domain: String,
    /// Owning customer.
    pub custid: String,
    /// Brand settings, restricted to [`BRAND_SETTING_KEYS`].
    pub brand: BTreeMap<String, String>,
    /// Creation epoch.
    pub created: i64,
    /// Last update epoch.
    pub updated: i64,
}

impl CustomDomain {
    /// Creates a custom domain record with an empty brand.
    #[must_use]
    pub fn new(domain: DisplayDomain, custid: impl Into<String>, now: DateTime<Utc>) -> Self {
        let epoch = now.timestamp();
        Self {
            display_domain: domain.into(),
            custid: custid.into(),
            brand: BTreeMap::new(),
            created: epoch,
            updated: epoch,
        }
    }

    /// Applies a brand patch: explicit nulls remove keys, present values
    /// overwrite after validation, unknown keys are dropped silently.
    pub fn apply_brand_patch(&mut self, patch: &BrandPatch, now: DateTime<Utc>) -> AppResult<()> {
        for (key, value) in patch {
            if !BRAND_SETTING_KEYS.contains(&key.as_str()) {
                continue;
            }

            match value {
                None => {
                    self.brand.remove(key);
                }
                Some(value) => {
                    validate_brand_value(key, value)?;
                    self.brand.insert(key.clone(), value.clone());
                }
            }
        }

        self.updated = now.timestamp();
        Ok(())
    }
}

/// Validates a single brand setting value against its key's rules.
pub fn validate_brand_value(key: &str, value: &str) -> AppResult<()> {
    match key {
        "primary_color" => {
            if !is_hex_color(value) {
                return Err(AppError::Validation(format!(
                    "invalid primary color '{value}'"
                )));
            }
        }
        "font_family" => {
            if !FONT_FAMILIES.contains(&value) {
                return Err(AppError::Validation(format!(
                    "invalid font family '{value}'"
                )));
            }
        }
        "corner_style" => {
            if !CORNER_STYLES.contains(&value) {
                return Err(AppError::Validation(format!(
                    "invalid corner style '{value}'"
                )));
            }
        }
        "allow_public_homepage" | "allow_public_api" => {
            if value != "true" && value != "false" {
                return Err(AppError::Validation(format!(
                    "'{key}' must be 'true' or 'false'"
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

/// Accepts `#RGB` and `#RRGGBB` hex colors.
fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_domain_is_accepted_and_lowercased() {
        let domain = DisplayDomain::new("Secrets.Example.COM");
        assert!(domain.is_ok());
        assert_eq!(
            domain.unwrap_or_else(|_| panic!("test")).as_str(),
            "secrets.example.com"
        );
    }

    #[test]
    fn domain_without_dot_is_rejected() {
        assert!(DisplayDomain::new("localhost").is_err());
    }

    #[test]
    fn domain_with_bad_label_is_rejected() {
        assert!(DisplayDomain::new("-bad.example.com").is_err());
        assert!(DisplayDomain::new("sp ace.example.com").is_err());
    }

    #[test]
    fn hex_colors_accept_short_and_long_forms() {
        assert!(validate_brand_value("primary_color", "#fff").is_ok());
        assert!(validate_brand_value("primary_color", "#A1B2C3").is_ok());
        assert!(validate_brand_value("primary_color", "red").is_err());
        assert!(validate_brand_value("primary_color", "#12345").is_err());
    }

    #[test]
    fn font_family_is_restricted() {
        assert!(validate_brand_value("font_family", "serif").is_ok());
        assert!(validate_brand_value("font_family", "comic-sans").is_err());
    }

    #[test]
    fn corner_style_is_restricted() {
        assert!(validate_brand_value("corner_style", "pill").is_ok());
        assert!(validate_brand_value("corner_style", "bevel").is_err());
    }

    #[test]
    fn patch_removes_null_keys_and_drops_unknown_ones() {
        let domain = DisplayDomain::new("brand.example.com").unwrap_or_else(|_| panic!("test"));
        let mut record = CustomDomain::new(domain, "alex@example.com", Utc::now());

        let mut patch = BrandPatch::new();
        patch.insert("primary_color".to_owned(), Some("#336699".to_owned()));
        patch.insert("font_family".to_owned(), Some("serif".to_owned()));
        assert!(record.apply_brand_patch(&patch, Utc::now()).is_ok());
        assert_eq!(record.brand.len(), 2);

        let mut removal = BrandPatch::new();
        removal.insert("font_family".to_owned(), None);
        removal.insert("not_a_setting".to_owned(), Some("x".to_owned()));
        assert!(record.apply_brand_patch(&removal, Utc::now()).is_ok());
        assert_eq!(record.brand.len(), 1);
        assert!(record.brand.contains_key("primary_color"));
        assert!(!record.brand.contains_key("not_a_setting"));
    }

    #[test]
    fn patch_rejects_invalid_values() {
        let domain = DisplayDomain::new("brand.example.com").unwrap_or_else(|_| panic!("test"));
        let mut record = CustomDomain::new(domain, "alex@example.com", Utc::now());

        let mut patch = BrandPatch::new();
        patch.insert("corner_style".to_owned(), Some("bevel".to_owned()));
        assert!(record.apply_brand_patch(&patch, Utc::now()).is_err());
    }
}
