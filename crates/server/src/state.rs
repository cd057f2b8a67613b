//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::fulfillment::{CredentialStore, DeliveryLog, Issuer};
use crate::services::{AssetSource, CatalogResolver, Notifier, TenantDirectory};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The credential store and delivery log are
/// the process-wide shared mutable state; every mutation goes through their
/// synchronized interfaces. Collaborators are trait objects so tests can
/// substitute in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<CredentialStore>,
    issuer: Issuer,
    deliveries: DeliveryLog,
    catalog: Arc<dyn CatalogResolver>,
    notifier: Arc<dyn Notifier>,
    tenants: Arc<dyn TenantDirectory>,
    assets: Arc<dyn AssetSource>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<CredentialStore>,
        catalog: Arc<dyn CatalogResolver>,
        notifier: Arc<dyn Notifier>,
        tenants: Arc<dyn TenantDirectory>,
        assets: Arc<dyn AssetSource>,
    ) -> Self {
        let issuer = Issuer::new(Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                issuer,
                deliveries: DeliveryLog::new(),
                catalog,
                notifier,
                tenants,
                assets,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Get a reference to the credential issuer.
    #[must_use]
    pub fn issuer(&self) -> &Issuer {
        &self.inner.issuer
    }

    /// Get a reference to the delivery log.
    #[must_use]
    pub fn deliveries(&self) -> &DeliveryLog {
        &self.inner.deliveries
    }

    /// Get a reference to the catalog resolver.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogResolver {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the notifier.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Get a reference to the tenant directory.
    #[must_use]
    pub fn tenants(&self) -> &dyn TenantDirectory {
        self.inner.tenants.as_ref()
    }

    /// Get a reference to the asset source.
    #[must_use]
    pub fn assets(&self) -> &dyn AssetSource {
        self.inner.assets.as_ref()
    }
}
