//! The cart: an ordered, id-unique sequence of line-items.
//!
//! Every transition returns a new [`Cart`] rather than mutating in place, so
//! a caller can compute the next state, persist it, and only then publish it.
//! Deserialization validates the invariants, which makes a stored cart that
//! violates them fail to decode instead of loading half-broken.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{CartItem, Price, Product, ProductId};

/// A cart value that would break one of the [`Cart`] invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartInvariantError {
    /// Two line-items share a product id.
    #[error("duplicate line-item for product {0}")]
    DuplicateProduct(ProductId),
    /// A line-item has a zero quantity.
    #[error("line-item for product {0} has zero amount")]
    ZeroAmount(ProductId),
}

/// Ordered cart contents.
///
/// ## Invariants
///
/// - No two line-items share a product id
/// - Every line-item's amount is at least 1
/// - Order is the order in which products were first added
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line-items, checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if two items share an id or any amount is zero.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartInvariantError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(item.id()));
            }
            if !seen.insert(item.id()) {
                return Err(CartInvariantError::DuplicateProduct(item.id()));
            }
        }
        Ok(Self { items })
    }

    /// Line-items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the line-item for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether the product has a line-item.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line-items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all line-items.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Quantity in cart keyed by product id.
    #[must_use]
    pub fn amounts(&self) -> HashMap<ProductId, u32> {
        self.items
            .iter()
            .map(|item| (item.id(), item.amount))
            .collect()
    }

    /// Sum of every line total.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Append a product with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the product already has a line-item.
    pub fn with_added(&self, product: Product) -> Result<Self, CartInvariantError> {
        if self.contains(product.id) {
            return Err(CartInvariantError::DuplicateProduct(product.id));
        }
        let mut items = self.items.clone();
        items.push(CartItem::new(product, 1));
        Ok(Self { items })
    }

    /// Replace the quantity of an existing line-item.
    ///
    /// Returns `None` if the product is not in the cart or `amount` is zero.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Option<Self> {
        if amount == 0 || !self.contains(id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id() == id {
                    CartItem::new(item.product.clone(), amount)
                } else {
                    item.clone()
                }
            })
            .collect();
        Some(Self { items })
    }

    /// Drop the line-item for a product.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();
        Some(Self { items })
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
