//! The cart store.
//!
//! [`CartStore`] is the single source of truth for the cart. It is cheaply
//! cloneable and is handed to whatever needs the cart; views subscribe to
//! changes with [`CartStore::subscribe`] instead of polling.
//!
//! # Consistency
//!
//! Mutations are serialized by a per-store async mutex that is held for the
//! whole read-modify-write, including the catalog round trip. Each mutation
//! computes the next cart from the current one, persists it, and only then
//! swaps it in and publishes it. Overlapping calls therefore never lose an
//! update, and memory never runs ahead of storage: a failed write leaves both
//! at the previous value.
//!
//! # Outcomes
//!
//! The `try_*` operations return a typed [`CartChange`] or [`CartError`]. The
//! plain operations run the same logic, log the cause, and hand the user a
//! single [`Notification`]; they never return an error.

use std::sync::Arc;

use rocketshoes_core::{Cart, Product, ProductId};
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::catalog::CatalogApi;
use crate::error::CartError;
use crate::notify::{Notification, Notifier};
use crate::storage::{self, CartStorage, LoadReport};

/// The three cart operations, as reported to the notification layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

/// A committed change to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line-item with quantity 1.
    Added { product_id: ProductId },
    /// An existing line-item's quantity was replaced.
    AmountChanged { product_id: ProductId, amount: u32 },
    /// A line-item was dropped.
    Removed { product_id: ProductId },
}

/// Request to set a line-item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Target quantity. Zero and negative values are rejected.
    pub amount: i64,
}

/// Cart state container backed by a catalog, durable storage, and a
/// notification sink.
pub struct CartStore<C> {
    inner: Arc<CartStoreInner<C>>,
}

struct CartStoreInner<C> {
    catalog: C,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    storage_key: String,
    load_report: LoadReport,
    /// Authoritative cart; the lock also serializes mutations.
    cart: Mutex<Cart>,
    published: watch::Sender<Cart>,
}

impl<C> Clone for CartStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CatalogApi> CartStore<C> {
    /// Open the store, restoring the cart from `storage_key`.
    ///
    /// Missing or invalid stored content yields an empty cart; see
    /// [`CartStore::load_report`] for which one happened.
    pub fn open(
        catalog: C,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let (cart, load_report) = storage::load_cart(storage.as_ref(), &storage_key);

        match &load_report {
            LoadReport::Missing => tracing::debug!(key = %storage_key, "No stored cart"),
            LoadReport::Loaded { items } => {
                tracing::debug!(key = %storage_key, items, "Restored cart");
            }
            LoadReport::Discarded { reason } => {
                tracing::warn!(key = %storage_key, reason = %reason, "Discarded stored cart");
            }
        }

        let (published, _) = watch::channel(cart.clone());

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                storage,
                notifier,
                storage_key,
                load_report,
                cart: Mutex::new(cart),
                published,
            }),
        }
    }

    /// Current cart contents.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.published.borrow().clone()
    }

    /// Watch the cart. The receiver sees every committed change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.published.subscribe()
    }

    /// How the cart was restored when the store was opened.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.inner.load_report
    }

    /// Storage slot the cart is mirrored to.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// The catalog this store reads from.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.inner.catalog
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add one unit of a product, or append it with quantity 1 if new.
    ///
    /// An existing line-item goes through the quantity-update path, stock
    /// check included.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) {
        let (operation, outcome) = self.run_add(product_id).await;
        self.report(operation, &outcome);
    }

    /// [`add_product`](Self::add_product) without the notification.
    ///
    /// # Errors
    ///
    /// Returns why the cart was not changed.
    pub async fn try_add_product(&self, product_id: ProductId) -> Result<CartChange, CartError> {
        self.run_add(product_id).await.1
    }

    /// Remove a product's line-item.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) {
        let outcome = self.try_remove_product(product_id).await;
        self.report(CartOperation::Remove, &outcome);
    }

    /// [`remove_product`](Self::remove_product) without the notification.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if there is nothing to remove, or a
    /// storage error if the new cart could not be persisted.
    pub async fn try_remove_product(&self, product_id: ProductId) -> Result<CartChange, CartError> {
        let mut cart = self.inner.cart.lock().await;
        let next = cart
            .without(product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        self.commit(&mut cart, next)?;
        Ok(CartChange::Removed { product_id })
    }

    /// Set a line-item's quantity, subject to stock.
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, amount = request.amount)
    )]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) {
        let outcome = self.try_update_product_amount(request).await;
        self.report(CartOperation::UpdateAmount, &outcome);
    }

    /// [`update_product_amount`](Self::update_product_amount) without the
    /// notification.
    ///
    /// # Errors
    ///
    /// Returns the first guard that refused the change: non-positive amount,
    /// stock lookup failure or absence, product not in cart, or not enough
    /// stock.
    pub async fn try_update_product_amount(
        &self,
        request: UpdateProductAmount,
    ) -> Result<CartChange, CartError> {
        let mut cart = self.inner.cart.lock().await;
        self.update_locked(&mut cart, request.product_id, request.amount)
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run the add path, returning which path decided the outcome.
    async fn run_add(
        &self,
        product_id: ProductId,
    ) -> (CartOperation, Result<CartChange, CartError>) {
        let mut cart = self.inner.cart.lock().await;

        let product = match self.inner.catalog.product(product_id).await {
            Ok(product) => product,
            Err(e) => return (CartOperation::Add, Err(e.into())),
        };

        // Key by the id the catalog returned
        if let Some(existing) = cart.get(product.id).map(|item| item.amount) {
            let outcome = self
                .update_locked(&mut cart, product.id, i64::from(existing) + 1)
                .await;
            return (CartOperation::UpdateAmount, outcome);
        }

        (CartOperation::Add, self.append_locked(&mut cart, product))
    }

    fn append_locked(&self, cart: &mut Cart, product: Product) -> Result<CartChange, CartError> {
        let product_id = product.id;
        let next = cart.with_added(product)?;
        self.commit(cart, next)?;
        Ok(CartChange::Added { product_id })
    }

    async fn update_locked(
        &self,
        cart: &mut Cart,
        product_id: ProductId,
        amount: i64,
    ) -> Result<CartChange, CartError> {
        if amount <= 0 {
            return Err(CartError::InvalidAmount(amount));
        }

        let stock = self
            .inner
            .catalog
            .stock(product_id)
            .await?
            .ok_or(CartError::StockUnavailable(product_id))?;

        if !cart.contains(product_id) {
            return Err(CartError::NotInCart(product_id));
        }

        let out_of_stock = CartError::OutOfStock {
            product_id,
            requested: amount,
            available: stock.amount,
        };
        if amount > i64::from(stock.amount) {
            return Err(out_of_stock);
        }
        let amount = u32::try_from(amount).map_err(|_| out_of_stock)?;

        let next = cart
            .with_amount(product_id, amount)
            .ok_or(CartError::NotInCart(product_id))?;
        self.commit(cart, next)?;
        Ok(CartChange::AmountChanged { product_id, amount })
    }

    /// Persist `next`, then make it the current cart and publish it.
    fn commit(&self, cart: &mut Cart, next: Cart) -> Result<(), CartError> {
        storage::save_cart(self.inner.storage.as_ref(), &self.inner.storage_key, &next)?;
        *cart = next;
        self.inner.published.send_replace(cart.clone());
        Ok(())
    }

    fn report(&self, operation: CartOperation, outcome: &Result<CartChange, CartError>) {
        match outcome {
            Ok(change) => tracing::info!(?operation, ?change, "Cart updated"),
            Err(e) if e.is_rejection() => {
                tracing::warn!(?operation, error = %e, "Cart operation rejected");
            }
            Err(e) => tracing::error!(?operation, error = %e, "Cart operation failed"),
        }

        self.inner
            .notifier
            .notify(Notification::for_outcome(operation, outcome));
    }
}

impl<C> std::fmt::Debug for CartStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.storage_key)
            .field("items", &self.inner.published.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rocketshoes_core::{Price, Stock};

    use super::*;
    use crate::catalog::CatalogError;
    use crate::notify::{Severity, messages};
    use crate::storage::{MemoryStorage, StorageError};

    const KEY: &str = "@RocketShoes:cart";

    // =========================================================================
    // Test doubles
    // =========================================================================

    #[derive(Default)]
    struct FakeCatalog {
        products: StdMutex<HashMap<ProductId, Product>>,
        stock: StdMutex<HashMap<ProductId, u32>>,
        fail_products: bool,
        delay: Option<Duration>,
        stock_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_product(self, id: i32, name: &str, cents: i64, stock: u32) -> Self {
            let id = ProductId::new(id);
            self.products.lock().unwrap().insert(
                id,
                Product {
                    id,
                    name: name.to_string(),
                    price: Price::from_cents(cents),
                    image_url: "x".to_string(),
                },
            );
            self.stock.lock().unwrap().insert(id, stock);
            self
        }

        fn without_stock_record(self, id: i32) -> Self {
            self.stock.lock().unwrap().remove(&ProductId::new(id));
            self
        }
    }

    impl CatalogApi for FakeCatalog {
        async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_products {
                return Err(CatalogError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.products
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("products/{id}")))
        }

        async fn stock(&self, id: ProductId) -> Result<Option<Stock>, CatalogError> {
            self.stock_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .stock
                .lock()
                .unwrap()
                .get(&id)
                .map(|&amount| Stock { id, amount }))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: StdMutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn all(&self) -> Vec<(Severity, &'static str)> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|n| (n.severity, n.message))
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    /// Reads like `MemoryStorage` but refuses every write.
    struct ReadOnlyStorage(MemoryStorage);

    impl CartStorage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    struct Harness {
        store: CartStore<FakeCatalog>,
        storage: Arc<MemoryStorage>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn stored(&self) -> Option<String> {
            self.storage.get(KEY).unwrap()
        }

        fn amounts(&self) -> Vec<(i32, u32)> {
            self.store
                .cart()
                .items()
                .iter()
                .map(|item| (item.id().as_i32(), item.amount))
                .collect()
        }
    }

    fn stored_cart(items: &[(i32, u32)]) -> String {
        let items: Vec<_> = items
            .iter()
            .map(|&(id, amount)| {
                serde_json::json!({
                    "id": id,
                    "title": format!("Shoe {id}"),
                    "price": 10,
                    "image": "x",
                    "amount": amount,
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    fn harness(catalog: FakeCatalog, items: &[(i32, u32)]) -> Harness {
        let storage = Arc::new(if items.is_empty() {
            MemoryStorage::new()
        } else {
            MemoryStorage::with_slot(KEY, &stored_cart(items))
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CartStore::open(catalog, storage.clone(), notifier.clone(), KEY);
        Harness {
            store,
            storage,
            notifier,
        }
    }

    // =========================================================================
    // Add
    // =========================================================================

    #[tokio::test]
    async fn test_add_new_product_to_empty_cart() {
        let h = harness(FakeCatalog::default().with_product(1, "Shoe", 1_000, 3), &[]);

        h.store.add_product(ProductId::new(1)).await;

        let cart = h.store.cart();
        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.amount, 1);
        assert_eq!(item.product.name, "Shoe");
        assert_eq!(h.notifier.all(), vec![(Severity::Success, messages::PRODUCT_ADDED)]);

        let persisted: Cart = serde_json::from_str(&h.stored().unwrap()).unwrap();
        assert_eq!(persisted, cart);
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_amount() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            &[(1, 1)],
        );

        h.store.add_product(ProductId::new(1)).await;

        assert_eq!(h.amounts(), vec![(1, 2)]);
        assert_eq!(h.notifier.all(), vec![(Severity::Info, messages::AMOUNT_CHANGED)]);
        let persisted: Cart = serde_json::from_str(&h.stored().unwrap()).unwrap();
        assert_eq!(persisted.get(ProductId::new(1)).unwrap().amount, 2);
    }

    #[tokio::test]
    async fn test_add_existing_product_beyond_stock() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 1),
            &[(1, 1)],
        );

        let outcome = h.store.try_add_product(ProductId::new(1)).await;
        assert!(matches!(
            outcome,
            Err(CartError::OutOfStock {
                requested: 2,
                available: 1,
                ..
            })
        ));

        h.store.add_product(ProductId::new(1)).await;
        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::OUT_OF_STOCK)]);
    }

    #[tokio::test]
    async fn test_add_existing_product_without_stock_record() {
        let h = harness(
            FakeCatalog::default()
                .with_product(1, "Shoe", 1_000, 5)
                .without_stock_record(1),
            &[(1, 1)],
        );

        h.store.add_product(ProductId::new(1)).await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::UPDATE_FAILED)]);
    }

    #[tokio::test]
    async fn test_add_catalog_failure_commits_nothing() {
        let catalog = FakeCatalog {
            fail_products: true,
            ..FakeCatalog::default()
        };
        let h = harness(catalog, &[]);

        h.store.add_product(ProductId::new(1)).await;

        assert!(h.store.cart().is_empty());
        assert!(h.stored().is_none());
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::ADD_FAILED)]);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let h = harness(FakeCatalog::default(), &[]);

        let outcome = h.store.try_add_product(ProductId::new(42)).await;
        assert!(matches!(
            outcome,
            Err(CartError::Catalog(CatalogError::NotFound(_)))
        ));
        assert!(h.store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_adds_never_duplicate() {
        let h = harness(
            FakeCatalog::default()
                .with_product(1, "Shoe", 1_000, 10)
                .with_product(2, "Boot", 2_000, 10),
            &[],
        );

        for id in [1, 2, 1, 1, 2] {
            h.store.add_product(ProductId::new(id)).await;
        }

        assert_eq!(h.amounts(), vec![(1, 3), (2, 2)]);
    }

    #[tokio::test]
    async fn test_overlapping_adds_serialize() {
        let catalog = FakeCatalog {
            delay: Some(Duration::from_millis(20)),
            ..FakeCatalog::default()
        }
        .with_product(1, "Shoe", 1_000, 5);
        let h = harness(catalog, &[]);

        tokio::join!(
            h.store.add_product(ProductId::new(1)),
            h.store.add_product(ProductId::new(1)),
        );

        assert_eq!(h.amounts(), vec![(1, 2)]);
        let persisted: Cart = serde_json::from_str(&h.stored().unwrap()).unwrap();
        assert_eq!(persisted, h.store.cart());
    }

    #[tokio::test]
    async fn test_store_is_shareable_across_tasks() {
        let h = harness(FakeCatalog::default().with_product(1, "Shoe", 1_000, 5), &[]);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let store = h.store.clone();
                tokio::spawn(async move { store.try_add_product(ProductId::new(1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(h.amounts(), vec![(1, 3)]);
    }

    // =========================================================================
    // Remove
    // =========================================================================

    #[tokio::test]
    async fn test_remove_existing_product() {
        let h = harness(FakeCatalog::default(), &[(1, 1)]);

        h.store.remove_product(ProductId::new(1)).await;

        assert!(h.store.cart().is_empty());
        assert_eq!(h.stored().as_deref(), Some("[]"));
        assert_eq!(h.notifier.all(), vec![(Severity::Warning, messages::PRODUCT_REMOVED)]);
    }

    #[tokio::test]
    async fn test_remove_missing_product_leaves_cart_unchanged() {
        let h = harness(FakeCatalog::default(), &[(2, 1)]);
        let before = h.store.cart();
        let stored_before = h.stored();

        h.store.remove_product(ProductId::new(1)).await;

        assert_eq!(h.store.cart(), before);
        assert_eq!(h.stored(), stored_before);
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::REMOVE_FAILED)]);
    }

    #[tokio::test]
    async fn test_remove_keeps_order_of_remaining_items() {
        let h = harness(FakeCatalog::default(), &[(3, 1), (1, 2), (2, 4)]);

        h.store.try_remove_product(ProductId::new(1)).await.unwrap();

        assert_eq!(h.amounts(), vec![(3, 1), (2, 4)]);
    }

    // =========================================================================
    // Update amount
    // =========================================================================

    #[tokio::test]
    async fn test_update_amount_within_stock() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            &[(1, 1), (2, 1)],
        );

        let outcome = h
            .store
            .try_update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 5,
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CartChange::AmountChanged {
                product_id: ProductId::new(1),
                amount: 5
            }
        );
        assert_eq!(h.amounts(), vec![(1, 5), (2, 1)]);
    }

    #[tokio::test]
    async fn test_update_amount_over_stock_is_rejected() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            &[(1, 2)],
        );
        let stored_before = h.stored();

        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 10,
            })
            .await;

        assert_eq!(h.amounts(), vec![(1, 2)]);
        assert_eq!(h.stored(), stored_before);
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::OUT_OF_STOCK)]);
    }

    #[tokio::test]
    async fn test_update_non_positive_amount_never_mutates() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            &[(1, 2)],
        );

        for amount in [0, -1, i64::MIN] {
            h.store
                .update_product_amount(UpdateProductAmount {
                    product_id: ProductId::new(1),
                    amount,
                })
                .await;
        }

        assert_eq!(h.amounts(), vec![(1, 2)]);
        assert_eq!(h.store.catalog().stock_calls.load(Ordering::SeqCst), 0);
        assert!(
            h.notifier
                .all()
                .iter()
                .all(|&n| n == (Severity::Error, messages::UPDATE_FAILED))
        );
    }

    #[tokio::test]
    async fn test_update_product_not_in_cart() {
        let h = harness(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            &[(2, 1)],
        );

        let outcome = h
            .store
            .try_update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 1,
            })
            .await;

        assert!(matches!(outcome, Err(CartError::NotInCart(id)) if id == ProductId::new(1)));
    }

    #[tokio::test]
    async fn test_update_without_stock_record() {
        let h = harness(FakeCatalog::default(), &[(1, 1)]);

        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 2,
            })
            .await;

        assert_eq!(h.amounts(), vec![(1, 1)]);
        assert_eq!(h.notifier.all(), vec![(Severity::Error, messages::UPDATE_FAILED)]);
    }

    #[test]
    fn test_update_request_deserializes_camel_case() {
        let request: UpdateProductAmount =
            serde_json::from_str(r#"{"productId": 3, "amount": 2}"#).unwrap();
        assert_eq!(request.product_id, ProductId::new(3));
        assert_eq!(request.amount, 2);
    }

    // =========================================================================
    // Persistence and subscription
    // =========================================================================

    #[tokio::test]
    async fn test_storage_failure_commits_nothing() {
        let storage = Arc::new(ReadOnlyStorage(MemoryStorage::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CartStore::open(
            FakeCatalog::default().with_product(1, "Shoe", 1_000, 5),
            storage,
            notifier.clone(),
            KEY,
        );
        let rx = store.subscribe();

        store.add_product(ProductId::new(1)).await;

        assert!(store.cart().is_empty());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(notifier.all(), vec![(Severity::Error, messages::ADD_FAILED)]);
    }

    #[tokio::test]
    async fn test_subscribers_see_committed_changes() {
        let h = harness(FakeCatalog::default().with_product(1, "Shoe", 1_000, 5), &[]);
        let mut rx = h.store.subscribe();

        h.store.add_product(ProductId::new(1)).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        // A rejected operation publishes nothing
        h.store.remove_product(ProductId::new(9)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_open_restores_stored_cart() {
        let h = harness(FakeCatalog::default(), &[(4, 2), (1, 1)]);

        assert_eq!(h.amounts(), vec![(4, 2), (1, 1)]);
        assert_eq!(h.store.load_report(), &LoadReport::Loaded { items: 2 });
    }

    #[test]
    fn test_open_with_invalid_storage_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_slot(KEY, "[{\"id\": 1}]"));
        let store = CartStore::open(
            FakeCatalog::default(),
            storage,
            Arc::new(RecordingNotifier::default()),
            KEY,
        );

        assert!(store.cart().is_empty());
        assert!(matches!(store.load_report(), LoadReport::Discarded { .. }));
    }

    #[test]
    fn test_debug_output() {
        let h = harness(FakeCatalog::default(), &[(1, 1)]);
        let debug_output = format!("{:?}", h.store);
        assert!(debug_output.contains("@RocketShoes:cart"));
    }
}
