//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DROPWIRE_BASE_URL` - Public URL customers reach this service at
//! - `DROPWIRE_TENANTS_FILE` - Path to the JSON tenants file
//! - `DROPWIRE_CATALOG_FILE` - Path to the JSON product → asset mapping file
//! - `SMTP_HOST` - SMTP relay hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM_ADDRESS` - Sender address for delivery emails
//!
//! ## Optional
//! - `DROPWIRE_HOST` - Bind address (default: 127.0.0.1)
//! - `DROPWIRE_PORT` - Listen port (default: 3000)
//! - `DROPWIRE_UPLOADS_DIR` - Asset root for local locators (default: uploads)
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `DOWNLOAD_TTL_HOURS` - Credential lifetime (default: 24)
//! - `DOWNLOAD_MAX_USES` - Redemptions per credential (default: 3)
//! - `CREDENTIAL_SWEEP_INTERVAL_SECS` - Store GC cadence (default: 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::TimeDelta;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dropwire server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for delivery and download links
    pub base_url: String,
    /// Path to the JSON tenants file
    pub tenants_file: PathBuf,
    /// Path to the JSON product → asset mapping file
    pub catalog_file: PathBuf,
    /// Root directory for locally stored assets
    pub uploads_dir: PathBuf,
    /// Credential lifetime applied by the webhook flow
    pub download_ttl: TimeDelta,
    /// Redemptions allowed per webhook-issued credential
    pub download_max_uses: u32,
    /// How often the store sweeps dead credentials
    pub sweep_interval: std::time::Duration,
    /// SMTP transport configuration
    pub smtp: SmtpConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// SMTP transport configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP relay hostname
    pub host: String,
    /// SMTP relay port
    pub port: u16,
    /// SMTP authentication username
    pub username: String,
    /// SMTP authentication password
    pub password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DROPWIRE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DROPWIRE_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or_default("DROPWIRE_PORT", 3000)?;
        let base_url = get_required_env("DROPWIRE_BASE_URL")?;
        let tenants_file = PathBuf::from(get_required_env("DROPWIRE_TENANTS_FILE")?);
        let catalog_file = PathBuf::from(get_required_env("DROPWIRE_CATALOG_FILE")?);
        let uploads_dir = PathBuf::from(get_env_or_default("DROPWIRE_UPLOADS_DIR", "uploads"));

        let ttl_hours: i64 = parse_env_or_default("DOWNLOAD_TTL_HOURS", 24)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DOWNLOAD_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let download_max_uses: u32 = parse_env_or_default("DOWNLOAD_MAX_USES", 3)?;
        if download_max_uses == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DOWNLOAD_MAX_USES".to_string(),
                "must be positive".to_string(),
            ));
        }
        let sweep_secs: u64 = parse_env_or_default("CREDENTIAL_SWEEP_INTERVAL_SECS", 3600)?;

        Ok(Self {
            host,
            port,
            base_url,
            tenants_file,
            catalog_file,
            uploads_dir,
            download_ttl: TimeDelta::hours(ttl_hours),
            download_max_uses,
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            smtp: SmtpConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Public URL of the delivery page for `order_id`.
    #[must_use]
    pub fn delivery_page_url(&self, order_id: &str) -> String {
        format!(
            "{}/orders/{order_id}/downloads",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Public URL redeeming `token`.
    #[must_use]
    pub fn download_url(&self, token: &str) -> String {
        format!("{}/downloads/{token}", self.base_url.trim_end_matches('/'))
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: get_required_env("SMTP_HOST")?,
            port: parse_env_or_default("SMTP_PORT", 587)?,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM_ADDRESS")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
