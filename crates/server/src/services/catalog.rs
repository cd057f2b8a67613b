//! Catalog resolver.
//!
//! Maps a purchased product to the asset locator of its digital good. Not
//! every line item resolves: physical products, gift cards, and anything else
//! without an attached asset simply yield `None` and are skipped during
//! fulfillment.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dropwire_core::{AssetLocator, ProductRef, TenantDomain};
use thiserror::Error;

use super::tenants::Tenant;

/// Errors resolving a product to an asset locator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog file is not valid JSON or has the wrong shape.
    #[error("malformed catalog file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Maps a purchased item to the locator of its digital asset.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Resolve `product_ref` within `tenant`'s catalog.
    ///
    /// Returns `Ok(None)` when the product has no digital asset attached; a
    /// resolver failure must not abort fulfillment of other line items in
    /// the same order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the lookup itself fails.
    async fn resolve(
        &self,
        tenant: &Tenant,
        product_ref: &ProductRef,
    ) -> Result<Option<AssetLocator>, CatalogError>;
}

/// Catalog backed by a per-tenant mapping table.
///
/// The production deployment loads the table from a JSON file of the shape
/// `{ "shop.myshopify.com": { "product-ref": "locator", … }, … }`; tests
/// build it directly with [`MappingCatalog::with_asset`].
#[derive(Debug, Default)]
pub struct MappingCatalog {
    by_tenant: HashMap<TenantDomain, HashMap<ProductRef, AssetLocator>>,
}

impl MappingCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON mapping file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let by_tenant = serde_json::from_str(&raw)?;
        Ok(Self { by_tenant })
    }

    /// Attach `locator` to `product_ref` under `domain` (builder style).
    #[must_use]
    pub fn with_asset(
        mut self,
        domain: TenantDomain,
        product_ref: ProductRef,
        locator: AssetLocator,
    ) -> Self {
        self.by_tenant
            .entry(domain)
            .or_default()
            .insert(product_ref, locator);
        self
    }
}

#[async_trait]
impl CatalogResolver for MappingCatalog {
    async fn resolve(
        &self,
        tenant: &Tenant,
        product_ref: &ProductRef,
    ) -> Result<Option<AssetLocator>, CatalogError> {
        Ok(self
            .by_tenant
            .get(&tenant.domain)
            .and_then(|products| products.get(product_ref))
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant(domain: &str) -> Tenant {
        Tenant {
            domain: TenantDomain::new(domain),
            name: "Test Shop".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_resolve_known_product() {
        let catalog = MappingCatalog::new().with_asset(
            TenantDomain::new("shop.myshopify.com"),
            ProductRef::new("guide-pdf"),
            AssetLocator::new("uploads/guide.pdf"),
        );

        let resolved = catalog
            .resolve(&tenant("shop.myshopify.com"), &ProductRef::new("guide-pdf"))
            .await
            .unwrap();
        assert_eq!(resolved, Some(AssetLocator::new("uploads/guide.pdf")));
    }

    #[tokio::test]
    async fn test_resolve_non_digital_product() {
        let catalog = MappingCatalog::new().with_asset(
            TenantDomain::new("shop.myshopify.com"),
            ProductRef::new("guide-pdf"),
            AssetLocator::new("uploads/guide.pdf"),
        );

        let resolved = catalog
            .resolve(&tenant("shop.myshopify.com"), &ProductRef::new("t-shirt"))
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_catalogs_are_tenant_scoped() {
        let catalog = MappingCatalog::new().with_asset(
            TenantDomain::new("shop-a.myshopify.com"),
            ProductRef::new("guide-pdf"),
            AssetLocator::new("uploads/a/guide.pdf"),
        );

        let resolved = catalog
            .resolve(
                &tenant("shop-b.myshopify.com"),
                &ProductRef::new("guide-pdf"),
            )
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_load_from_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{
                "shop.myshopify.com": {
                    "guide-pdf": "uploads/guide.pdf",
                    "wallpapers": "https://cdn.example.com/wallpapers.zip"
                }
            }"#,
        )
        .unwrap();

        let catalog = MappingCatalog::load(file.path()).unwrap();
        let resolved = catalog
            .resolve(&tenant("shop.myshopify.com"), &ProductRef::new("wallpapers"))
            .await
            .unwrap();
        assert_eq!(
            resolved,
            Some(AssetLocator::new("https://cdn.example.com/wallpapers.zip"))
        );
    }
}
