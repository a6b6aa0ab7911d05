//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests drive the real `HttpCatalog` and `FileStorage` against an
//! in-process mock of the catalog/stock API ([`MockCatalogServer`]), so no
//! external service is needed.
//!
//! # Test Categories
//!
//! - `cart_store` - Cart operations end to end over HTTP and the file store

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use rocketshoes_cart::config::CatalogConfig;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// What the mock returns for one resource.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// `200 OK` with this JSON body.
    Json(Value),
    /// An empty response with this status.
    Status(u16),
}

#[derive(Default)]
struct MockState {
    products: RwLock<HashMap<i32, MockResponse>>,
    stock: RwLock<HashMap<i32, MockResponse>>,
    product_requests: AtomicUsize,
    stock_requests: AtomicUsize,
}

/// Catalog/stock API served on an ephemeral local port.
///
/// Unknown ids answer `404 Not Found`. The server stops when dropped.
pub struct MockCatalogServer {
    base_url: Url,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockCatalogServer {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/products/{id}", get(product))
            .route("/stock/{id}", get(stock))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            base_url,
            state,
            handle,
        })
    }

    /// Base URL of the mock, with a trailing slash.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Catalog client settings pointing at the mock.
    #[must_use]
    pub fn catalog_config(&self, product_cache_ttl: Option<Duration>) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            product_cache_ttl,
        }
    }

    /// Serve a product record.
    pub fn add_product(&self, id: i32, title: &str, price: f64) {
        self.set_product_response(
            id,
            MockResponse::Json(json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.rocketshoes.test/{id}.jpg"),
            })),
        );
    }

    /// Serve a stock record.
    pub fn set_stock(&self, id: i32, amount: u32) {
        self.set_stock_response(id, MockResponse::Json(json!({ "id": id, "amount": amount })));
    }

    pub fn set_product_response(&self, id: i32, response: MockResponse) {
        self.state
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, response);
    }

    pub fn set_stock_response(&self, id: i32, response: MockResponse) {
        self.state
            .stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, response);
    }

    /// Number of `GET /products/{id}` requests served so far.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.product_requests.load(Ordering::SeqCst)
    }

    /// Number of `GET /stock/{id}` requests served so far.
    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.state.stock_requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockCatalogServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn product(State(state): State<Arc<MockState>>, Path(id): Path<i32>) -> Response {
    state.product_requests.fetch_add(1, Ordering::SeqCst);
    let response = state
        .products
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    respond(response)
}

async fn stock(State(state): State<Arc<MockState>>, Path(id): Path<i32>) -> Response {
    state.stock_requests.fetch_add(1, Ordering::SeqCst);
    let response = state
        .stock
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    respond(response)
}

fn respond(response: Option<MockResponse>) -> Response {
    match response {
        Some(MockResponse::Json(body)) => axum::Json(body).into_response(),
        Some(MockResponse::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
