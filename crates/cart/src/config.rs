//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ROCKETSHOES_API_URL` - Catalog/stock API base URL (default: `http://localhost:3333`)
//! - `ROCKETSHOES_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product detail cache TTL, 0 disables (default: 300)
//! - `ROCKETSHOES_STORAGE_PATH` - Local storage file (default: `<data dir>/rocketshoes/storage.json`)
//! - `ROCKETSHOES_STORAGE_KEY` - Storage slot holding the cart (default: `@RocketShoes:cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Storage slot the storefront has always used for the cart.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote catalog/stock API configuration
    pub catalog: CatalogConfig,
    /// Durable storage configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote catalog/stock API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL; `products/{id}` and `stock/{id}` are resolved against it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product details stay cached; `None` disables the cache
    pub product_cache_ttl: Option<Duration>,
}

/// Durable storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File holding the key-value slots
    pub path: PathBuf,
    /// Slot holding the serialized cart
    pub key: String,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "ROCKETSHOES_API_URL",
            &lookup("ROCKETSHOES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;
        let timeout_secs = parse_secs(
            "ROCKETSHOES_HTTP_TIMEOUT_SECS",
            lookup("ROCKETSHOES_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let cache_ttl_secs = parse_secs(
            "ROCKETSHOES_PRODUCT_CACHE_TTL_SECS",
            lookup("ROCKETSHOES_PRODUCT_CACHE_TTL_SECS"),
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        let path = lookup("ROCKETSHOES_STORAGE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(default_storage_path, PathBuf::from);
        let key = lookup("ROCKETSHOES_STORAGE_KEY")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        Ok(Self {
            catalog: CatalogConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                product_cache_ttl: (cache_ttl_secs > 0)
                    .then(|| Duration::from_secs(cache_ttl_secs)),
            },
            storage: StorageConfig { path, key },
            sentry_dsn: lookup("SENTRY_DSN").filter(|value| !value.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, ensuring relative joins keep its path.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    // Url::join replaces the last segment unless the path ends with '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Parse a whole number of seconds, falling back to a default when unset.
fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    value.map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// `<data dir>/rocketshoes/storage.json`, or a dot-directory in the working
/// directory on platforms without a data dir.
fn default_storage_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".rocketshoes").join("storage.json"),
        |dir| dir.join("rocketshoes").join("storage.json"),
    )
}
