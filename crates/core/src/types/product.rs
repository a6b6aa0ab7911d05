//! Catalog records and cart line-items.
//!
//! Field names follow the catalog API (`title`, `image`). The Rust-facing
//! names (`name`, `image_url`) are also accepted on input so carts written by
//! older clients still load.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as served by the catalog (`GET products/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "title", alias = "name")]
    pub name: String,
    pub price: Price,
    #[serde(rename = "image", alias = "imageUrl")]
    pub image_url: String,
}

/// Units available for a product (`GET stock/{id}`).
///
/// Fetched fresh for every quantity change; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    pub amount: u32,
}

/// A product in the cart together with its cart-local quantity.
///
/// Serializes flat, as the catalog record plus an `amount` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    /// Create a line-item for a product entering the cart.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// The product id this line-item is keyed by.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.amount)
    }
}
