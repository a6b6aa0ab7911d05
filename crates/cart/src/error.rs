//! Cart operation errors.
//!
//! [`CartError`] is what a cart operation reports internally. It never
//! reaches the user as-is: the public store operations turn it into a
//! [`Notification`](crate::notify::Notification) and log the cause.

use rocketshoes_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Why a cart operation did not commit.
#[derive(Debug, Error)]
pub enum CartError {
    /// Catalog or stock request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Persisting the cart failed; nothing was committed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The new cart value would break an invariant.
    #[error("Invalid cart: {0}")]
    Invariant(#[from] CartInvariantError),

    /// The product has no line-item.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Requested quantity is zero or negative.
    #[error("Invalid amount {0}: must be at least 1")]
    InvalidAmount(i64),

    /// The stock service has no record for the product.
    #[error("No stock record for product {0}")]
    StockUnavailable(ProductId),

    /// Requested quantity exceeds what is in stock.
    #[error("Requested {requested} of product {product_id}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },
}

impl CartError {
    /// Whether the operation was refused by cart rules rather than failing
    /// on a collaborator.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotInCart(_)
                | Self::InvalidAmount(_)
                | Self::StockUnavailable(_)
                | Self::OutOfStock { .. }
        )
    }
}
