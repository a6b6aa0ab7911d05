//! RocketShoes cart library.
//!
//! Client-side cart state for the storefront: a single [`CartStore`] owns the
//! cart, talks to the remote catalog for product details and stock, mirrors
//! every committed change to durable key-value storage, and reports each
//! outcome to a notification sink.
//!
//! # Architecture
//!
//! - [`catalog`] - `CatalogApi` trait, `reqwest` client, and `moka` product cache
//! - [`storage`] - `CartStorage` trait with file-backed and in-memory slots
//! - [`notify`] - user-facing notifications and their message table
//! - [`store`] - the `CartStore` itself
//! - [`config`] - environment-driven configuration
//!
//! Collaborators are injected when the store is opened; nothing is looked up
//! from ambient state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{CachedCatalog, CatalogApi, CatalogError, HttpCatalog};
pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use notify::{ChannelNotifier, Notification, Notifier, Severity};
pub use storage::{CartStorage, FileStorage, LoadReport, MemoryStorage, StorageError};
pub use store::{CartChange, CartOperation, CartStore, UpdateProductAmount};
