//! Dropwire Server - Digital-goods fulfillment bridge.
//!
//! This binary receives e-commerce order webhooks, issues time- and
//! count-limited download credentials, and emails customers a delivery link.
//!
//! # Architecture
//!
//! - Axum web framework
//! - In-memory credential store (single instance; credentials do not survive
//!   a restart)
//! - JSON file-backed tenant directory and product → asset catalog
//! - SMTP via lettre for delivery notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use dropwire_server::config::ServerConfig;
use dropwire_server::fulfillment::{CredentialStore, SystemClock};
use dropwire_server::routes;
use dropwire_server::services::{
    LocalAssetSource, MappingCatalog, SmtpNotifier, StaticTenantDirectory,
};
use dropwire_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dropwire_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if _sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    // Load collaborators
    let tenants = StaticTenantDirectory::load(&config.tenants_file)
        .expect("Failed to load tenants file");
    tracing::info!(tenants = tenants.len(), "Tenant directory loaded");

    let catalog =
        MappingCatalog::load(&config.catalog_file).expect("Failed to load catalog file");

    let notifier = SmtpNotifier::new(&config.smtp).expect("Failed to configure SMTP transport");

    let assets = LocalAssetSource::new(config.uploads_dir.clone());

    // The credential store is the process-wide shared mutable state
    let store = Arc::new(CredentialStore::new(Arc::new(SystemClock)));

    // Periodic sweep so dead credentials do not accumulate forever
    let sweep_store = Arc::clone(&store);
    let sweep_interval = config.sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            let removed = sweep_store.sweep();
            if removed > 0 {
                tracing::info!(removed, "Swept unredeemable credentials");
            }
        }
    });

    // Build application state and router
    let addr = config.socket_addr();
    let state = AppState::new(
        config,
        store,
        Arc::new(catalog),
        Arc::new(notifier),
        Arc::new(tenants),
        Arc::new(assets),
    );

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    tracing::info!("dropwire-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
