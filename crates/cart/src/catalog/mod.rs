//! Remote catalog and stock service.
//!
//! # Architecture
//!
//! - [`CatalogApi`] is the seam the cart store depends on
//! - [`HttpCatalog`] talks to the storefront REST API with `reqwest`
//! - [`CachedCatalog`] keeps product details in a `moka` cache; stock is
//!   always fetched live because it gates every quantity change
//!
//! # Endpoints
//!
//! - `GET products/{id}` - product details
//! - `GET stock/{id}` - units available

mod cache;
mod client;

pub use cache::CachedCatalog;
pub use client::HttpCatalog;

use std::future::Future;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read access to product details and stock levels.
pub trait CatalogApi: Send + Sync {
    /// Fetch product details.
    ///
    /// A product the catalog does not know is a [`CatalogError::NotFound`].
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    /// Fetch the current stock level.
    ///
    /// Returns `Ok(None)` when the service has no stock record for the id.
    fn stock(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Stock>, CatalogError>> + Send;
}
