//! Product records supplied by the external catalog.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A read-only product record as the catalog API returns it.
///
/// Extra fields in the catalog payload (ratings and the like) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    /// Image URL.
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

/// The subset of a product the cart keeps: `{id, title, price, image}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}

impl From<&ProductRecord> for CartProduct {
    fn from(record: &ProductRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            price: record.price,
            image: record.image.clone(),
        }
    }
}

impl From<ProductRecord> for CartProduct {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            price: record.price,
            image: record.image,
        }
    }
}
