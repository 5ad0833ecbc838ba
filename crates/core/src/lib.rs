//! Arwa Shop Core - Shared types library.
//!
//! This crate provides common types used across all Arwa Shop components:
//! - `cart` - Cart store, change notification and storage backends
//! - `cli` - Command-line front end driving the cart against a file store
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, quantities, and the
//!   read-only product records supplied by the catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
