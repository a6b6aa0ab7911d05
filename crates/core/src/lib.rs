//! RocketShoes Core - Shared cart domain types.
//!
//! This crate provides the types used across all RocketShoes components:
//! - `cart` - Cart store, catalog client, and local persistence
//! - `cli` - Command-line front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no
//! storage access, no HTTP clients. Every cart transition is a function from
//! one [`Cart`] value to another, which keeps the store's critical section
//! small and makes the invariants testable without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, catalog records, and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
