use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use ephemera_application::CreateAccountParams;
use ephemera_core::{AppError, SessionIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{
    AuthenticateRequest, CreateAccountRequest, CustomerResponse, GenericMessageResponse,
};
use crate::error::ApiResult;
use crate::middleware::client_identifier;
use crate::state::AppState;

pub const SESSION_IDENTITY_KEY: &str = "session_identity";

/// POST /api/account - Create a customer account.
pub async fn create_account_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<CustomerResponse>)> {
    let subject = client_identifier(&headers, peer);

    let customer = state
        .customer_service
        .create_account(
            &subject,
            CreateAccountParams {
                email: payload.email,
                passphrase: payload.passphrase,
                planid: payload.planid,
            },
        )
        .await?;

    info!(
        custid = %customer.obscured_email(),
        planid = %customer.planid,
        "[new-customer] account created"
    );

    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// POST /api/authenticate - Authenticate with email and passphrase.
pub async fn authenticate_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<AuthenticateRequest>,
) -> ApiResult<Json<CustomerResponse>> {
    let subject = client_identifier(&headers, peer);

    let customer = state
        .customer_service
        .authenticate(&subject, &payload.email, &payload.passphrase)
        .await?;

    let identity = SessionIdentity::new(
        customer.custid.clone(),
        customer.role.as_str(),
        customer.verified,
    );

    // Regenerate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_IDENTITY_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(Json(customer.into()))
}

/// POST /api/logout - Destroy the session.
pub async fn logout_handler(session: Session) -> ApiResult<Json<GenericMessageResponse>> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to destroy session: {error}")))?;

    Ok(Json(GenericMessageResponse {
        message: "logged out".to_owned(),
    }))
}
