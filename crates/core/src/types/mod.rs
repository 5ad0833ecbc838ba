//! Core types for Arwa Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod price;
pub mod product;
pub mod quantity;

pub use catalog::{ProductCatalog, StaticCatalog};
pub use id::*;
pub use price::Price;
pub use product::{CartProduct, ProductRecord};
pub use quantity::{Quantity, QuantityError};
