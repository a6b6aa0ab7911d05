//! Catalog REST client.

use std::sync::Arc;

use reqwest::StatusCode;
use rocketshoes_core::{Product, ProductId, Stock};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogApi, CatalogError};
use crate::config::CatalogConfig;

/// Default `Retry-After` when the API rate limits without saying how long.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Client for the storefront catalog/stock API.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCatalogInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Execute a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = self.inner.base_url.join(path)?;
        debug!(%url, "Catalog request");

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| CatalogError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(path, response).await)
    }

    /// Map a non-success response to a [`CatalogError`].
    async fn parse_error(path: &str, response: reqwest::Response) -> CatalogError {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return CatalogError::RateLimited(retry_after);
        }

        if status == StatusCode::NOT_FOUND {
            return CatalogError::NotFound(path.to_string());
        }

        let message = response
            .text()
            .await
            .map(|body| body.chars().take(200).collect::<String>())
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(
            status = %status,
            path = %path,
            body = %message,
            "Catalog API returned non-success status"
        );

        CatalogError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl CatalogApi for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.get(&format!("products/{id}")).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<Option<Stock>, CatalogError> {
        match self.get::<Option<Stock>>(&format!("stock/{id}")).await {
            Err(CatalogError::NotFound(_)) => Ok(None),
            other => other,
        }
    }
}

impl std::fmt::Debug for HttpCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalog")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base: &str) -> CatalogConfig {
        CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
            product_cache_ttl: None,
        }
    }

    #[test]
    fn test_debug_shows_base_url() {
        let client = HttpCatalog::new(&config("http://localhost:3333/")).unwrap();
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("http://localhost:3333/"));
    }

    #[test]
    fn test_paths_resolve_under_base() {
        let client = HttpCatalog::new(&config("http://api.test/v1/")).unwrap();
        assert_eq!(
            client.base_url().join("stock/4").unwrap().as_str(),
            "http://api.test/v1/stock/4"
        );
    }
}
