use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use ephemera_core::AppError;
use sha2::{Digest, Sha256};
use tower_sessions::cookie::Key;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub redis_url: String,
    pub frontend_url: String,
    pub session_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub colonels: Vec<String>,
    pub rate_limit_overrides: Vec<(String, u32)>,
    pub secret_default_ttl: Option<i64>,
    pub metadata_ttl: Option<i64>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let redis_url = required_env("REDIS_URL")?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        Url::parse(&frontend_url)
            .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;

        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let colonels = env::var("COLONELS")
            .unwrap_or_default()
            .split(',')
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .collect();

        let rate_limit_overrides = parse_rate_limits(&env::var("RATE_LIMITS").unwrap_or_default())?;

        let secret_default_ttl = optional_seconds_env("SECRET_DEFAULT_TTL_SECONDS")?;
        let metadata_ttl = optional_seconds_env("METADATA_TTL_SECONDS")?;

        Ok(Self {
            redis_url,
            frontend_url,
            session_secret,
            api_host,
            api_port,
            cookie_secure,
            colonels,
            rate_limit_overrides,
            secret_default_ttl,
            metadata_ttl,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Session cookie signing key derived from SESSION_SECRET.
    pub fn session_key(&self) -> Result<Key, AppError> {
        derive_session_key(&self.session_secret)
    }
}

/// Expands SESSION_SECRET into the 64-byte master key the cookie jar wants
/// (signing half plus encryption half). Deterministic, so every instance
/// sharing the secret accepts each other's cookies.
fn derive_session_key(secret: &str) -> Result<Key, AppError> {
    let mut master = [0u8; 64];
    let signing = Sha256::new()
        .chain_update(secret.as_bytes())
        .chain_update(b"ephemera-session-signing")
        .finalize();
    let encryption = Sha256::new()
        .chain_update(secret.as_bytes())
        .chain_update(b"ephemera-session-encryption")
        .finalize();
    master[..32].copy_from_slice(&signing);
    master[32..].copy_from_slice(&encryption);

    Key::try_from(&master[..])
        .map_err(|error| AppError::Internal(format!("failed to derive session key: {error}")))
}

/// Parses `event=limit` comma pairs, e.g. `create_account=5,show_secret=500`.
fn parse_rate_limits(value: &str) -> Result<Vec<(String, u32)>, AppError> {
    let mut overrides = Vec::new();
    for pair in value.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (event, limit) = pair.split_once('=').ok_or_else(|| {
            AppError::Validation(format!(
                "RATE_LIMITS entries must look like 'event=limit', got '{pair}'"
            ))
        })?;
        let limit = limit.trim().parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid RATE_LIMITS limit for '{event}': {error}"))
        })?;
        overrides.push((event.trim().to_owned(), limit));
    }
    Ok(overrides)
}

fn optional_seconds_env(name: &str) -> Result<Option<i64>, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
