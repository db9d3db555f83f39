use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Extension, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use ephemera_core::{AppError, AppResult, SessionIdentity};
use tower_sessions::Session;

use crate::error::ApiResult;
use crate::handlers::account::SESSION_IDENTITY_KEY;
use crate::state::AppState;

/// Event name carried as a route-layer extension for [`rate_limit`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitScope {
    pub event: &'static str,
}

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<SessionIdentity>(SESSION_IDENTITY_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Route-level request throttle. Counts the extension-carried event against
/// the session identity when present, else the client IP, and fails the
/// request once over the limit. Use-case guards inside the services count
/// their own, finer-grained events.
pub async fn rate_limit(
    State(state): State<AppState>,
    Extension(scope): Extension<RateLimitScope>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    session: Session,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<SessionIdentity>(SESSION_IDENTITY_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    let subject = match identity {
        Some(identity) => identity.custid().to_owned(),
        None => client_identifier(request.headers(), peer),
    };

    state.rate_limit_service.enforce(&subject, scope.event).await?;
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    check_mutation_origin(request.method(), request.headers(), &state.frontend_url)?;
    Ok(next.run(request).await)
}

/// CSRF guard for state-changing methods. Safe methods pass untouched; a
/// mutation must either declare a non-cross-site fetch destination or carry
/// an `Origin`/`Referer` matching the configured frontend. A mutation with
/// neither header is rejected.
fn check_mutation_origin(
    method: &Method,
    headers: &HeaderMap,
    allowed_origin: &str,
) -> AppResult<()> {
    if !is_state_changing_method(method) {
        return Ok(());
    }

    if let Some(fetch_site) = headers.get("sec-fetch-site") {
        if fetch_site == HeaderValue::from_static("cross-site") {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()));
        }
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let origin_is_allowed = !origin.is_empty() && origin == allowed_origin;
    let referer_is_allowed = !referer.is_empty() && referer.starts_with(allowed_origin);

    if !origin_is_allowed && !referer_is_allowed {
        return Err(AppError::Unauthorized("origin validation failed".to_owned()));
    }

    Ok(())
}

/// Client identifier for rate limiting unauthenticated subjects: the first
/// `x-forwarded-for` hop when a proxy fronts the API, else the peer address
/// of the connection so direct clients never share a counter.
pub fn client_identifier(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| peer.ip().to_string())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
