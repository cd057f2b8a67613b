//! Integration test harness for Dropwire.
//!
//! Drives the full axum router in-process via `tower::ServiceExt::oneshot`,
//! with a manual clock, a recording notifier, and a temp uploads directory,
//! so end-to-end flows (webhook → delivery page → redemption) run without a
//! network, an SMTP relay, or sleeping across expiry boundaries.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dropwire-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::{TimeDelta, Utc};
use dropwire_core::{AssetLocator, Email, ProductRef, TenantDomain};
use dropwire_server::config::{ServerConfig, SmtpConfig};
use dropwire_server::fulfillment::{Clock, CredentialStore, ManualClock};
use dropwire_server::routes;
use dropwire_server::services::{
    CatalogError, CatalogResolver, LocalAssetSource, MappingCatalog, Notifier, NotifyError,
    StaticTenantDirectory, Tenant,
};
use dropwire_server::state::AppState;
use secrecy::SecretString;
use tower::ServiceExt;

/// Shop domain preconfigured in every test context's tenant directory.
pub const TEST_SHOP_DOMAIN: &str = "shop-a.myshopify.com";

/// Shop display name for [`TEST_SHOP_DOMAIN`].
pub const TEST_SHOP_NAME: &str = "Shop A";

/// Base URL the test server pretends to be reachable at.
pub const TEST_BASE_URL: &str = "http://dropwire.test";

/// A delivery email captured by [`RecordingNotifier`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Notifier double that records instead of sending.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingNotifier {
    /// Snapshot of everything sent so far.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the internal lock panicked.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(SentEmail {
                to: recipient.as_str().to_owned(),
                subject: subject.to_owned(),
                text_body: text_body.to_owned(),
                html_body: html_body.to_owned(),
            });
        Ok(())
    }
}

/// Notifier double whose transport always fails.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _recipient: &Email,
        _subject: &str,
        _text_body: &str,
        _html_body: &str,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::InvalidAddress("relay unreachable".to_owned()))
    }
}

/// Catalog double that fails for specific products.
///
/// Everything else delegates to an inner [`MappingCatalog`], which lets
/// partial-success behavior be exercised: one bad line item, the rest fine.
#[derive(Debug)]
pub struct FlakyCatalog {
    inner: MappingCatalog,
    failing: Vec<ProductRef>,
}

impl FlakyCatalog {
    #[must_use]
    pub fn new(inner: MappingCatalog, failing: Vec<ProductRef>) -> Self {
        Self { inner, failing }
    }
}

#[async_trait]
impl CatalogResolver for FlakyCatalog {
    async fn resolve(
        &self,
        tenant: &Tenant,
        product_ref: &ProductRef,
    ) -> Result<Option<AssetLocator>, CatalogError> {
        if self.failing.contains(product_ref) {
            return Err(CatalogError::Io(std::io::Error::other(
                "catalog backend unavailable",
            )));
        }
        self.inner.resolve(tenant, product_ref).await
    }
}

/// Everything a test needs to drive the server in-process.
pub struct TestContext {
    app: Router,
    /// The clock behind the credential store.
    pub clock: Arc<ManualClock>,
    /// The notifier double, for asserting on sent email.
    pub notifier: Arc<RecordingNotifier>,
    uploads: tempfile::TempDir,
}

impl TestContext {
    /// Build a context around `catalog` with the default recording notifier.
    ///
    /// # Panics
    ///
    /// Panics if the temp uploads directory cannot be created.
    #[must_use]
    pub fn new(catalog: impl CatalogResolver + 'static) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::with_notifier(catalog, Arc::clone(&notifier) as Arc<dyn Notifier>, notifier)
    }

    /// Build a context whose notifier always fails.
    #[must_use]
    pub fn with_failing_notifier(catalog: impl CatalogResolver + 'static) -> Self {
        // The recording half stays empty; assertions go through status codes
        let recorder = Arc::new(RecordingNotifier::default());
        Self::with_notifier(catalog, Arc::new(FailingNotifier), recorder)
    }

    fn with_notifier(
        catalog: impl CatalogResolver + 'static,
        notifier: Arc<dyn Notifier>,
        recorder: Arc<RecordingNotifier>,
    ) -> Self {
        let uploads = tempfile::tempdir().expect("create temp uploads dir");
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(CredentialStore::new(Arc::clone(&clock) as Arc<dyn Clock>));

        let tenants = StaticTenantDirectory::from_tenants([Tenant {
            domain: TenantDomain::new(TEST_SHOP_DOMAIN),
            name: TEST_SHOP_NAME.to_owned(),
        }]);

        let state = AppState::new(
            test_config(uploads.path().to_path_buf()),
            store,
            Arc::new(catalog),
            notifier,
            Arc::new(tenants),
            Arc::new(LocalAssetSource::new(uploads.path())),
        );

        Self {
            app: routes::router(state),
            clock,
            notifier: recorder,
            uploads,
        }
    }

    /// Write an asset file into the uploads directory.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_asset(&self, name: &str, contents: &[u8]) {
        let path = self.uploads.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create asset parent dir");
        }
        std::fs::write(path, contents).expect("write asset file");
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router rejects the request at the transport level.
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails at the service level")
    }

    /// `GET` a path.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    /// `POST` a JSON body.
    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }

    /// `POST` the order-created webhook as the test shop.
    pub async fn post_webhook(&self, body: &serde_json::Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri("/webhooks/orders/created")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-shopify-shop-domain", TEST_SHOP_DOMAIN)
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }
}

/// Collect a response body into a string.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Extract the download tokens linked from a delivery page, in page order.
#[must_use]
pub fn extract_tokens(page_html: &str) -> Vec<String> {
    page_html
        .match_indices("/downloads/")
        .map(|(idx, marker)| {
            let rest = &page_html[idx + marker.len()..];
            rest.chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect()
        })
        .collect()
}

fn test_config(uploads_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: TEST_BASE_URL.to_owned(),
        tenants_file: PathBuf::from("unused-tenants.json"),
        catalog_file: PathBuf::from("unused-catalog.json"),
        uploads_dir,
        download_ttl: TimeDelta::hours(24),
        download_max_uses: 3,
        sweep_interval: std::time::Duration::from_secs(3600),
        smtp: SmtpConfig {
            host: "smtp.test".to_owned(),
            port: 587,
            username: "unused".to_owned(),
            password: SecretString::from("unused-password"),
            from_address: "noreply@dropwire.test".to_owned(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}
