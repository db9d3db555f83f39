use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use ephemera_application::ConcealParams;
use ephemera_core::{AppError, SessionIdentity};
use ephemera_domain::ANONYMOUS_CUSTID;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{
    ConcealRequest, ConcealResponse, DashboardMetadataResponse, MetadataResponse, RevealRequest,
    RevealResponse, SecretLinkResponse,
};
use crate::error::ApiResult;
use crate::handlers::account::SESSION_IDENTITY_KEY;
use crate::middleware::client_identifier;
use crate::state::AppState;

/// Session identity when present, else the anonymous pseudo-customer plus
/// the client IP as rate limit subject.
async fn optional_identity(
    session: &Session,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> ApiResult<(String, String)> {
    let identity = session
        .get::<SessionIdentity>(SESSION_IDENTITY_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    Ok(match identity {
        Some(identity) => (identity.custid().to_owned(), identity.custid().to_owned()),
        None => (client_identifier(headers, peer), ANONYMOUS_CUSTID.to_owned()),
    })
}

/// POST /api/secret/conceal - Conceal a value and return the key pair.
pub async fn conceal_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<ConcealRequest>,
) -> ApiResult<(StatusCode, Json<ConcealResponse>)> {
    let (subject, custid) = optional_identity(&session, &headers, peer).await?;

    let pair = state
        .secret_service
        .conceal(
            &subject,
            &custid,
            ConcealParams {
                value: payload.secret,
                passphrase: payload.passphrase,
                ttl_seconds: payload.ttl,
                share_domain: payload.share_domain,
            },
        )
        .await?;

    info!(
        metadata = %pair.metadata.shortkey(),
        ttl = pair.secret.lifetime,
        "[conceal] secret created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ConcealResponse {
            metadata_key: pair.metadata.key,
            secret_key: pair.secret.key,
            secret_ttl: pair.secret.lifetime,
            share_domain: pair.metadata.share_domain,
        }),
    ))
}

/// GET /api/secret/{secret_key} - Secret link page probe; marks the receipt
/// viewed on first sight without revealing anything.
pub async fn secret_link_handler(
    State(state): State<AppState>,
    Path(secret_key): Path<String>,
) -> ApiResult<Json<SecretLinkResponse>> {
    let has_passphrase = state
        .secret_service
        .link_viewed(&secret_key)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown secret".to_owned()))?;

    Ok(Json(SecretLinkResponse {
        secret_key,
        has_passphrase,
    }))
}

/// POST /api/secret/{secret_key}/reveal - Reveal and destroy the secret.
pub async fn reveal_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Path(secret_key): Path<String>,
    payload: Option<Json<RevealRequest>>,
) -> ApiResult<Json<RevealResponse>> {
    let (subject, _) = optional_identity(&session, &headers, peer).await?;
    let passphrase = payload.and_then(|Json(body)| body.passphrase);

    let secret = state
        .secret_service
        .reveal(&subject, &secret_key, passphrase.as_deref())
        .await?;

    info!(metadata = %secret.metadata_key.chars().take(6).collect::<String>(), "[reveal] secret delivered");

    Ok(Json(RevealResponse {
        secret_key: secret.key,
        value: secret.value,
    }))
}

/// GET /api/private/{metadata_key} - Peek at a metadata receipt.
pub async fn metadata_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Path(metadata_key): Path<String>,
) -> ApiResult<Json<MetadataResponse>> {
    let (subject, _) = optional_identity(&session, &headers, peer).await?;

    let metadata = state.secret_service.metadata(&subject, &metadata_key).await?;
    Ok(Json(metadata.into()))
}

/// POST /api/private/{metadata_key}/burn - Destroy the secret unrevealed.
pub async fn burn_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Path(metadata_key): Path<String>,
) -> ApiResult<Json<MetadataResponse>> {
    let (subject, custid) = optional_identity(&session, &headers, peer).await?;

    let metadata = state
        .secret_service
        .burn(&subject, &custid, &metadata_key)
        .await?;

    info!(metadata = %metadata.shortkey(), "[burn] secret destroyed");

    Ok(Json(metadata.into()))
}

/// GET /api/private/recent - Dashboard listing of recent receipts.
pub async fn recent_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Json<Vec<DashboardMetadataResponse>>> {
    let records = state
        .secret_service
        .recent(identity.custid(), identity.custid())
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}
