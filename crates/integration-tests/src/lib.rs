//! Integration tests for the Arwa Shop cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p arwa-shop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Several contexts sharing one stored cart (in-memory tabs
//!   and file-backed handles)
//! - `cart_scenarios` - End-to-end cart flows on a single context

use arwa_shop_core::{CartProduct, Price, ProductId, StaticCatalog};

/// Catalog JSON in the product API's `GET /products` format.
pub const CATALOG_JSON: &str = r#"[
  {"id": 1, "title": "Fjallraven Backpack", "price": 109.95, "description": "Fits 15 inch laptops", "category": "men's clothing", "image": "https://example.com/1.jpg"},
  {"id": 2, "title": "Mens Casual T-Shirt", "price": 22.3, "description": "Slim fit", "category": "men's clothing", "image": "https://example.com/2.jpg"},
  {"id": 5, "title": "Dragon Bracelet", "price": 695, "description": "Silver", "category": "jewelery", "image": "https://example.com/5.jpg"},
  {"id": 9, "title": "Portable Hard Drive", "price": 64, "description": "USB 3.0", "category": "electronics", "image": "https://example.com/9.jpg"}
]"#;

/// The fixture catalog.
///
/// # Panics
///
/// Panics if [`CATALOG_JSON`] stops parsing.
#[must_use]
pub fn catalog() -> StaticCatalog {
    StaticCatalog::from_json(CATALOG_JSON).expect("fixture catalog parses")
}

/// A cart product with the given id and price in cents.
#[must_use]
pub fn product(id: i64, cents: i64) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        price: Price::from_cents(cents),
        image: format!("https://example.com/{id}.jpg"),
    }
}
