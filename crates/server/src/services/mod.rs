//! External collaborators consumed by the fulfillment core.
//!
//! Each collaborator is a narrow async trait held as an `Arc<dyn …>` in the
//! application state, so tests and alternative deployments can swap
//! implementations without touching the core:
//!
//! - [`catalog::CatalogResolver`] - maps a purchased product to its asset
//!   locator
//! - [`notifier::Notifier`] - delivers the rendered delivery email
//! - [`tenants::TenantDirectory`] - resolves which account owns an inbound
//!   webhook
//! - [`assets::AssetSource`] - opens locator content for streaming or
//!   redirect
//!
//! These are the only operations in the system expected to suspend; the
//! credential store itself never does I/O.

pub mod assets;
pub mod catalog;
pub mod notifier;
pub mod tenants;

pub use assets::{AssetContent, AssetError, AssetSource, LocalAssetSource};
pub use catalog::{CatalogError, CatalogResolver, MappingCatalog};
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
pub use tenants::{StaticTenantDirectory, Tenant, TenantDirectory, TenantLoadError};
