//! Tenant directory.
//!
//! Dropwire serves multiple shops from one instance. Inbound order webhooks
//! carry the shop's domain (Shopify sends it in `X-Shopify-Shop-Domain`);
//! the directory maps that domain to the owning tenant, and everything
//! downstream (catalog lookup, email copy) is scoped to that tenant.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dropwire_core::TenantDomain;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shop account served by this instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Commerce-platform domain the tenant's webhooks arrive from.
    pub domain: TenantDomain,
    /// Display name used in customer-facing email copy.
    pub name: String,
}

/// Errors loading the tenants file.
#[derive(Debug, Error)]
pub enum TenantLoadError {
    /// The file could not be read.
    #[error("failed to read tenants file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON or has the wrong shape.
    #[error("malformed tenants file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Maps an inbound event to its owning tenant.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look up the tenant owning `domain`, if any.
    async fn lookup_by_domain(&self, domain: &str) -> Option<Tenant>;
}

/// Tenant directory backed by an in-memory table, loaded once at boot.
#[derive(Debug, Default)]
pub struct StaticTenantDirectory {
    by_domain: HashMap<String, Tenant>,
}

impl StaticTenantDirectory {
    /// Build a directory from a list of tenants.
    #[must_use]
    pub fn from_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        Self {
            by_domain: tenants
                .into_iter()
                .map(|t| (t.domain.as_str().to_owned(), t))
                .collect(),
        }
    }

    /// Load a directory from a JSON file containing an array of tenants.
    ///
    /// # Errors
    ///
    /// Returns [`TenantLoadError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, TenantLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let tenants: Vec<Tenant> = serde_json::from_str(&raw)?;
        Ok(Self::from_tenants(tenants))
    }

    /// Number of configured tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    /// Whether no tenants are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn lookup_by_domain(&self, domain: &str) -> Option<Tenant> {
        self.by_domain.get(domain).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant(domain: &str, name: &str) -> Tenant {
        Tenant {
            domain: TenantDomain::new(domain),
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_lookup_known_domain() {
        let directory =
            StaticTenantDirectory::from_tenants([tenant("shop-a.myshopify.com", "Shop A")]);

        let found = directory.lookup_by_domain("shop-a.myshopify.com").await;
        assert_eq!(found, Some(tenant("shop-a.myshopify.com", "Shop A")));
    }

    #[tokio::test]
    async fn test_lookup_unknown_domain() {
        let directory =
            StaticTenantDirectory::from_tenants([tenant("shop-a.myshopify.com", "Shop A")]);

        assert_eq!(directory.lookup_by_domain("other.example.com").await, None);
    }

    #[test]
    fn test_load_from_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[
                {"domain": "shop-a.myshopify.com", "name": "Shop A"},
                {"domain": "shop-b.myshopify.com", "name": "Shop B"}
            ]"#,
        )
        .unwrap();

        let directory = StaticTenantDirectory::load(file.path()).unwrap();
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_load_malformed_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();

        assert!(matches!(
            StaticTenantDirectory::load(file.path()),
            Err(TenantLoadError::Malformed(_))
        ));
    }
}
