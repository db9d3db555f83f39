//! Request and response payloads for the JSON API.

use std::collections::BTreeMap;

use ephemera_domain::{CustomDomain, Customer, Metadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

// ---- accounts ----

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub passphrase: String,
    pub planid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub passphrase: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub custid: String,
    pub role: String,
    pub planid: String,
    pub verified: bool,
    pub created: i64,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            custid: customer.custid,
            role: customer.role.as_str().to_owned(),
            planid: customer.planid,
            verified: customer.verified,
            created: customer.created,
        }
    }
}

// ---- secrets ----

#[derive(Debug, Deserialize)]
pub struct ConcealRequest {
    pub secret: String,
    pub passphrase: Option<String>,
    pub ttl: Option<i64>,
    pub share_domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConcealResponse {
    pub metadata_key: String,
    pub secret_key: String,
    pub secret_ttl: i64,
    pub share_domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SecretLinkResponse {
    pub secret_key: String,
    pub has_passphrase: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct RevealRequest {
    pub passphrase: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevealResponse {
    pub secret_key: String,
    pub value: String,
}

/// Metadata receipt view. The full secret key appears only while the payload
/// still exists; dashboards get the shortkey.
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub metadata_key: String,
    pub state: String,
    pub secret_key: Option<String>,
    pub secret_shortkey: String,
    pub secret_ttl: i64,
    pub share_domain: Option<String>,
    pub viewed: Option<i64>,
    pub received: Option<i64>,
    pub burned: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

impl From<Metadata> for MetadataResponse {
    fn from(metadata: Metadata) -> Self {
        Self {
            metadata_key: metadata.key,
            state: metadata.state.as_str().to_owned(),
            secret_key: metadata.secret_key,
            secret_shortkey: metadata.secret_shortkey,
            secret_ttl: metadata.secret_ttl,
            share_domain: metadata.share_domain,
            viewed: metadata.viewed,
            received: metadata.received,
            burned: metadata.burned,
            created: metadata.created,
            updated: metadata.updated,
        }
    }
}

/// Dashboard listing view of a receipt. Carries the shortkey only: the full
/// secret key is the shareable capability and never appears in bulk
/// listings, only on the single-receipt peek where the share link is built.
#[derive(Debug, Serialize)]
pub struct DashboardMetadataResponse {
    pub metadata_key: String,
    pub state: String,
    pub secret_shortkey: String,
    pub secret_ttl: i64,
    pub share_domain: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl From<Metadata> for DashboardMetadataResponse {
    fn from(metadata: Metadata) -> Self {
        Self {
            metadata_key: metadata.key,
            state: metadata.state.as_str().to_owned(),
            secret_shortkey: metadata.secret_shortkey,
            secret_ttl: metadata.secret_ttl,
            share_domain: metadata.share_domain,
            created: metadata.created,
            updated: metadata.updated,
        }
    }
}

// ---- custom domains ----

#[derive(Debug, Deserialize)]
pub struct AddDomainRequest {
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub display_domain: String,
    pub brand: BTreeMap<String, String>,
    pub created: i64,
    pub updated: i64,
}

impl From<CustomDomain> for DomainResponse {
    fn from(domain: CustomDomain) -> Self {
        Self {
            display_domain: domain.display_domain,
            brand: domain.brand,
            created: domain.created,
            updated: domain.updated,
        }
    }
}
