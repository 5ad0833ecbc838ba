//! Read-only product catalog port.
//!
//! The catalog is an external collaborator: the cart only ever reads from it.
//! Fetching the catalog over the network is left to the caller; this module
//! defines the lookup trait and an in-memory implementation over records the
//! caller already has.

use super::id::ProductId;
use super::product::ProductRecord;

/// Read-only source of product records.
pub trait ProductCatalog {
    /// Look up one product by ID.
    fn product(&self, id: ProductId) -> Option<&ProductRecord>;

    /// All products, in catalog order.
    fn products(&self) -> &[ProductRecord];

    /// Distinct categories in order of first appearance.
    fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in self.products() {
            let category = record.category.as_str();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }

    /// Products in the same category as `id`, excluding `id` itself, in
    /// catalog order. Empty if `id` is unknown.
    fn related(&self, id: ProductId) -> Vec<&ProductRecord> {
        let Some(product) = self.product(id) else {
            return Vec::new();
        };
        self.products()
            .iter()
            .filter(|record| record.id != id && record.category == product.category)
            .collect()
    }
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<ProductRecord>,
}

impl StaticCatalog {
    /// Create a catalog from already-fetched records.
    #[must_use]
    pub const fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// Parse a catalog from the JSON array the product API returns.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload is not an array of
    /// product records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }
}

impl ProductCatalog for StaticCatalog {
    fn product(&self, id: ProductId) -> Option<&ProductRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn products(&self) -> &[ProductRecord] {
        &self.records
    }
}
