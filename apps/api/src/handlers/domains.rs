use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use ephemera_core::SessionIdentity;
use ephemera_domain::BrandPatch;
use tracing::info;

use crate::dto::{AddDomainRequest, DomainResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/domains - List the customer's domains.
pub async fn list_domains_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Json<Vec<DomainResponse>>> {
    let domains = state.domain_service.list_domains(identity.custid()).await?;
    Ok(Json(domains.into_iter().map(Into::into).collect()))
}

/// POST /api/domains - Register a custom domain.
pub async fn add_domain_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(payload): Json<AddDomainRequest>,
) -> ApiResult<(StatusCode, Json<DomainResponse>)> {
    let domain = state
        .domain_service
        .add_domain(identity.custid(), identity.custid(), &payload.domain)
        .await?;

    info!(domain = %domain.display_domain, "[domain] registered");

    Ok((StatusCode::CREATED, Json(domain.into())))
}

/// DELETE /api/domains/{domain} - Remove a custom domain.
pub async fn remove_domain_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(domain): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .domain_service
        .remove_domain(identity.custid(), identity.custid(), &domain)
        .await?;

    info!(domain = %domain, "[domain] removed");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/domains/{domain}/brand - Apply a brand patch.
pub async fn update_brand_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(domain): Path<String>,
    Json(patch): Json<BrandPatch>,
) -> ApiResult<Json<DomainResponse>> {
    let domain = state
        .domain_service
        .update_brand(identity.custid(), identity.custid(), &domain, &patch)
        .await?;

    Ok(Json(domain.into()))
}
