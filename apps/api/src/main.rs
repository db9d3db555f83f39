//! Ephemera API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod redis_session_store;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use ephemera_application::{
    CustomDomainService, CustomerService, RateLimitEvents, RateLimitService, SecretService,
};
use ephemera_core::AppError;
use ephemera_infrastructure::{
    Argon2PassphraseHasher, RedisCounterStore, RedisCustomDomainRepository,
    RedisCustomerRepository, RedisMetadataRepository, RedisSecretRepository,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::middleware::RateLimitScope;
use crate::redis_session_store::RedisSessionStore;
use crate::state::AppState;

/// Built-in per-window limits; RATE_LIMITS env pairs override them.
const DEFAULT_RATE_LIMITS: &[(&str, u32)] = &[
    ("create_account", 10),
    ("authenticate_session", 20),
    ("failed_passphrase", 5),
    ("conceal_secret", 250),
    ("show_metadata", 1000),
    ("show_secret", 1000),
    ("burn_secret", 250),
    ("add_domain", 30),
    ("remove_domain", 30),
    ("update_domain_brand", 100),
    ("api_requests", 1000),
];

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;

    // Fail fast when the store is unreachable; nothing works without it.
    let mut probe = redis_client
        .get_multiplexed_async_connection()
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;
    redis::cmd("PING")
        .query_async::<String>(&mut probe)
        .await
        .map_err(|error| AppError::Internal(format!("redis ping failed: {error}")))?;

    let mut events = RateLimitEvents::new();
    events.register_events(DEFAULT_RATE_LIMITS.iter().copied());
    events.register_events(config.rate_limit_overrides.clone());
    for (event, limit) in events.iter() {
        info!(event, limit, "rate limit registered");
    }

    let counter_store = Arc::new(RedisCounterStore::new(redis_client.clone()));
    let rate_limit_service = RateLimitService::new(counter_store, Arc::new(events));

    let passphrase_hasher = Arc::new(Argon2PassphraseHasher::new());
    let customer_repository = Arc::new(RedisCustomerRepository::new(redis_client.clone()));
    let secret_repository = Arc::new(RedisSecretRepository::new(redis_client.clone()));
    let metadata_repository = Arc::new(RedisMetadataRepository::new(redis_client.clone()));
    let domain_repository = Arc::new(RedisCustomDomainRepository::new(redis_client.clone()));

    let app_state = AppState {
        customer_service: CustomerService::new(
            customer_repository,
            passphrase_hasher.clone(),
            rate_limit_service.clone(),
            config.colonels.clone(),
        ),
        secret_service: SecretService::new(
            secret_repository,
            metadata_repository,
            passphrase_hasher,
            rate_limit_service.clone(),
            config.secret_default_ttl,
            config.metadata_ttl,
        ),
        domain_service: CustomDomainService::new(domain_repository, rate_limit_service.clone()),
        rate_limit_service,
        frontend_url: config.frontend_url.clone(),
    };

    let session_store = RedisSessionStore::new(redis_client);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_signed(config.session_key()?)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let protected_routes = Router::new()
        .route("/api/private/recent", get(handlers::secrets::recent_handler))
        .route(
            "/api/domains",
            get(handlers::domains::list_domains_handler)
                .post(handlers::domains::add_domain_handler),
        )
        .route(
            "/api/domains/{domain}",
            delete(handlers::domains::remove_domain_handler),
        )
        .route(
            "/api/domains/{domain}/brand",
            put(handlers::domains::update_brand_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let api_routes = Router::new()
        .route("/api/account", post(handlers::account::create_account_handler))
        .route(
            "/api/authenticate",
            post(handlers::account::authenticate_handler),
        )
        .route("/api/logout", post(handlers::account::logout_handler))
        .route(
            "/api/secret/conceal",
            post(handlers::secrets::conceal_handler),
        )
        .route(
            "/api/secret/{secret_key}",
            get(handlers::secrets::secret_link_handler),
        )
        .route(
            "/api/secret/{secret_key}/reveal",
            post(handlers::secrets::reveal_handler),
        )
        .route(
            "/api/private/{metadata_key}",
            get(handlers::secrets::metadata_handler),
        )
        .route(
            "/api/private/{metadata_key}/burn",
            post(handlers::secrets::burn_handler),
        )
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum::Extension(RateLimitScope {
            event: "api_requests",
        }));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "ephemera-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
