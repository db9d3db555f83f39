//! Custom domain ports and application service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ephemera_core::{AppError, AppResult};
use ephemera_domain::{BrandPatch, CustomDomain, DisplayDomain};

use crate::rate_limit_service::RateLimitService;

pub(crate) const ADD_DOMAIN_EVENT: &str = "add_domain";
pub(crate) const REMOVE_DOMAIN_EVENT: &str = "remove_domain";
pub(crate) const UPDATE_BRAND_EVENT: &str = "update_domain_brand";

/// Repository port for custom domain persistence.
#[async_trait]
pub trait CustomDomainRepository: Send + Sync {
    /// Persists a domain record, overwriting any previous version.
    async fn save(&self, domain: &CustomDomain) -> AppResult<()>;

    /// Loads a customer's domain record by hostname.
    async fn load(&self, display_domain: &str, custid: &str) -> AppResult<Option<CustomDomain>>;

    /// All domains owned by a customer, in insertion order.
    async fn list_for_customer(&self, custid: &str) -> AppResult<Vec<CustomDomain>>;

    /// Removes a customer's domain record.
    async fn delete(&self, display_domain: &str, custid: &str) -> AppResult<()>;
}

/// Application service for customer-branded domains.
#[derive(Clone)]
pub struct CustomDomainService {
    domain_repository: Arc<dyn CustomDomainRepository>,
    rate_limits: RateLimitService,
}

impl CustomDomainService {
    /// Creates a custom domain service.
    #[must_use]
    pub fn new(
        domain_repository: Arc<dyn CustomDomainRepository>,
        rate_limits: RateLimitService,
    ) -> Self {
        Self {
            domain_repository,
            rate_limits,
        }
    }

    /// Registers a domain for a customer.
    pub async fn add_domain(
        &self,
        subject_identifier: &str,
        custid: &str,
        domain: &str,
    ) -> AppResult<CustomDomain> {
        self.rate_limits
            .enforce(subject_identifier, ADD_DOMAIN_EVENT)
            .await?;

        let domain = DisplayDomain::new(domain)?;

        if self
            .domain_repository
            .load(domain.as_str(), custid)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "domain '{}' is already registered",
                domain.as_str()
            )));
        }

        let record = CustomDomain::new(domain, custid, Utc::now());
        self.domain_repository.save(&record).await?;
        Ok(record)
    }

    /// Lists a customer's domains.
    pub async fn list_domains(&self, custid: &str) -> AppResult<Vec<CustomDomain>> {
        self.domain_repository.list_for_customer(custid).await
    }

    /// Removes a customer's domain.
    pub async fn remove_domain(
        &self,
        subject_identifier: &str,
        custid: &str,
        domain: &str,
    ) -> AppResult<()> {
        self.rate_limits
            .enforce(subject_identifier, REMOVE_DOMAIN_EVENT)
            .await?;

        let domain = DisplayDomain::new(domain)?;

        if self
            .domain_repository
            .load(domain.as_str(), custid)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("domain not found".to_owned()));
        }

        self.domain_repository.delete(domain.as_str(), custid).await
    }

    /// Applies a brand patch to a customer's domain.
    pub async fn update_brand(
        &self,
        subject_identifier: &str,
        custid: &str,
        domain: &str,
        patch: &BrandPatch,
    ) -> AppResult<CustomDomain> {
        self.rate_limits
            .enforce(subject_identifier, UPDATE_BRAND_EVENT)
            .await?;

        let domain = DisplayDomain::new(domain)?;

        let mut record = self
            .domain_repository
            .load(domain.as_str(), custid)
            .await?
            .ok_or_else(|| AppError::NotFound("domain not found".to_owned()))?;

        record.apply_brand_patch(patch, Utc::now())?;
        self.domain_repository.save(&record).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::rate_limit_service::{CounterStore, RateLimitEvents};

    #[derive(Default)]
    struct TestDomainRepo {
        records: Mutex<HashMap<(String, String), CustomDomain>>,
    }

    impl TestDomainRepo {
        fn lock(
            &self,
        ) -> AppResult<std::sync::MutexGuard<'_, HashMap<(String, String), CustomDomain>>>
        {
            self.records
                .lock()
                .map_err(|error| AppError::Internal(format!("lock: {error}")))
        }
    }

    #[async_trait]
    impl CustomDomainRepository for TestDomainRepo {
        async fn save(&self, domain: &CustomDomain) -> AppResult<()> {
            self.lock()?.insert(
                (domain.display_domain.clone(), domain.custid.clone()),
                domain.clone(),
            );
            Ok(())
        }

        async fn load(
            &self,
            display_domain: &str,
            custid: &str,
        ) -> AppResult<Option<CustomDomain>> {
            Ok(self
                .lock()?
                .get(&(display_domain.to_owned(), custid.to_owned()))
                .cloned())
        }

        async fn list_for_customer(&self, custid: &str) -> AppResult<Vec<CustomDomain>> {
            let mut records: Vec<CustomDomain> = self
                .lock()?
                .values()
                .filter(|record| record.custid == custid)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.created.cmp(&b.created));
            Ok(records)
        }

        async fn delete(&self, display_domain: &str, custid: &str) -> AppResult<()> {
            self.lock()?
                .remove(&(display_domain.to_owned(), custid.to_owned()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestCounterStore {
        counts: Mutex<HashMap<String, i64>>,
    }

    #[async_trait]
    impl CounterStore for TestCounterStore {
        async fn increment(&self, key: &str, _ttl_seconds: i64) -> AppResult<i64> {
            let mut counts = self
                .counts
                .lock()
                .map_err(|error| AppError::Internal(format!("lock: {error}")))?;
            let count = counts.entry(key.to_owned()).or_insert(0);
            *count += 1;
            Ok(*count)
        }

        async fn count(&self, key: &str) -> AppResult<i64> {
            Ok(*self
                .counts
                .lock()
                .map_err(|error| AppError::Internal(format!("lock: {error}")))?
                .get(key)
                .unwrap_or(&0))
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self
                .counts
                .lock()
                .map_err(|error| AppError::Internal(format!("lock: {error}")))?
                .contains_key(key))
        }

        async fn remaining_ttl(&self, _key: &str) -> AppResult<Option<i64>> {
            Ok(None)
        }

        async fn set_ttl(&self, _key: &str, _ttl_seconds: i64) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.counts
                .lock()
                .map_err(|error| AppError::Internal(format!("lock: {error}")))?
                .remove(key);
            Ok(())
        }
    }

    fn service() -> CustomDomainService {
        service_with_events(RateLimitEvents::new())
    }

    fn service_with_events(events: RateLimitEvents) -> CustomDomainService {
        let rate_limits =
            RateLimitService::new(Arc::new(TestCounterStore::default()), Arc::new(events));
        CustomDomainService::new(Arc::new(TestDomainRepo::default()), rate_limits)
    }

    #[tokio::test]
    async fn add_domain_normalizes_and_persists() {
        let service = service();
        let added = service
            .add_domain("203.0.113.7", "alex@example.com", "Secrets.Example.COM")
            .await;
        assert_eq!(
            added.map(|d| d.display_domain).ok(),
            Some("secrets.example.com".to_owned())
        );

        let listing = service.list_domains("alex@example.com").await;
        assert_eq!(listing.map(|d| d.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn add_domain_rejects_duplicates() {
        let service = service();
        assert!(service
            .add_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await
            .is_ok());

        let again = service
            .add_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn add_domain_rejects_invalid_hostnames() {
        let service = service();
        let outcome = service
            .add_domain("203.0.113.7", "alex@example.com", "localhost")
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn remove_domain_requires_an_existing_record() {
        let service = service();
        let outcome = service
            .remove_domain("203.0.113.7", "alex@example.com", "missing.example.com")
            .await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));

        assert!(service
            .add_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await
            .is_ok());
        assert!(service
            .remove_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await
            .is_ok());
        assert_eq!(
            service.list_domains("alex@example.com").await.map(|d| d.len()).ok(),
            Some(0)
        );
    }

    #[tokio::test]
    async fn domains_are_scoped_per_customer() {
        let service = service();
        assert!(service
            .add_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await
            .is_ok());

        // A different customer cannot see or brand the record.
        let listing = service.list_domains("other@example.com").await;
        assert_eq!(listing.map(|d| d.len()).ok(), Some(0));

        let patch = BrandPatch::new();
        let outcome = service
            .update_brand(
                "203.0.113.9",
                "other@example.com",
                "secrets.example.com",
                &patch,
            )
            .await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_brand_applies_a_patch() {
        let service = service();
        assert!(service
            .add_domain("203.0.113.7", "alex@example.com", "secrets.example.com")
            .await
            .is_ok());

        let mut patch = BrandPatch::new();
        patch.insert("primary_color".to_owned(), Some("#336699".to_owned()));
        patch.insert("corner_style".to_owned(), Some("pill".to_owned()));
        let updated = service
            .update_brand(
                "203.0.113.7",
                "alex@example.com",
                "secrets.example.com",
                &patch,
            )
            .await;
        match updated {
            Ok(record) => {
                assert_eq!(record.brand.get("primary_color").map(String::as_str), Some("#336699"));
                assert_eq!(record.brand.get("corner_style").map(String::as_str), Some("pill"));
            }
            Err(error) => panic!("update_brand failed: {error}"),
        }
    }

    #[tokio::test]
    async fn update_brand_checks_the_limit_before_the_record() {
        let mut events = RateLimitEvents::new();
        events.register_event("update_domain_brand", 0);
        let service = service_with_events(events);

        // Guard fires before existence is checked, so even a missing domain
        // reports the throttle.
        let patch = BrandPatch::new();
        let outcome = service
            .update_brand(
                "203.0.113.7",
                "alex@example.com",
                "missing.example.com",
                &patch,
            )
            .await;
        assert!(matches!(outcome, Err(AppError::RateLimited { .. })));
    }
}
