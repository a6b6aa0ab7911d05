//! Product detail cache in front of a catalog.

use std::time::Duration;

use moka::future::Cache;
use rocketshoes_core::{Product, ProductId, Stock};
use tracing::debug;

use super::{CatalogApi, CatalogError};

const MAX_CACHED_PRODUCTS: u64 = 1000;

/// Caches product details for a fixed TTL. Stock lookups pass straight
/// through.
pub struct CachedCatalog<C> {
    inner: C,
    products: Option<Cache<ProductId, Product>>,
}

impl<C: CatalogApi> CachedCatalog<C> {
    /// Wrap a catalog. A `ttl` of `None` disables caching entirely.
    #[must_use]
    pub fn new(inner: C, ttl: Option<Duration>) -> Self {
        let products = ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PRODUCTS)
                .time_to_live(ttl)
                .build()
        });

        Self { inner, products }
    }

    /// The wrapped catalog.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CatalogApi> CatalogApi for CachedCatalog<C> {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let Some(cache) = &self.products else {
            return self.inner.product(id).await;
        };

        if let Some(product) = cache.get(&id).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(product);
        }

        let product = self.inner.product(id).await?;
        cache.insert(id, product.clone()).await;
        Ok(product)
    }

    async fn stock(&self, id: ProductId) -> Result<Option<Stock>, CatalogError> {
        self.inner.stock(id).await
    }
}
