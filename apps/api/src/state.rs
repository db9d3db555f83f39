use ephemera_application::{CustomDomainService, CustomerService, RateLimitService, SecretService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub customer_service: CustomerService,
    pub secret_service: SecretService,
    pub domain_service: CustomDomainService,
    pub rate_limit_service: RateLimitService,
    pub frontend_url: String,
}
