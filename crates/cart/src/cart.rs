//! Cart and line-item model.
//!
//! These are plain values: every mutation here is in memory only. Persisting
//! and notifying is the job of [`crate::CartStore`].

use arwa_shop_core::{CartProduct, Price, ProductId, Quantity};
use serde::{Deserialize, Serialize};

/// One product entry in the cart with its quantity.
///
/// Persisted as `{id, title, price, image, quantity}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub quantity: Quantity,
}

impl LineItem {
    /// A new line with a single unit of `product`.
    #[must_use]
    pub fn new(product: &CartProduct) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: Quantity::ONE,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Ordered line items; position is fixed by the first add of each product.
///
/// Serializes as a bare JSON array in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Parse a persisted cart.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `raw` is not a JSON array of line
    /// items, or any line has a quantity below 1.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize for persistence.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add one unit of `product`.
    ///
    /// An existing line keeps its position, title, price and image and only
    /// gains a unit. Otherwise a new line with quantity 1 is appended. Returns
    /// the line's new quantity.
    pub fn add_or_increment(&mut self, product: &CartProduct) -> Quantity {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == product.id) {
            item.quantity = item.quantity.incremented();
            return item.quantity;
        }
        self.items.push(LineItem::new(product));
        Quantity::ONE
    }

    /// Replace the quantity of the line for `id` in place.
    ///
    /// Returns `false` and leaves the cart unchanged if no line matches.
    pub fn set_quantity(&mut self, id: ProductId, quantity: Quantity) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Drop every line for `id`. Returns how many lines were removed.
    pub fn remove(&mut self, id: ProductId) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        before - self.items.len()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Total number of units, the figure shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<LineItem> for Cart {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i64, title: &str, cents: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            title: title.to_string(),
            price: Price::from_cents(cents),
            image: format!("{id}.png"),
        }
    }

    fn line(id: i64, cents: i64, quantity: i64) -> LineItem {
        LineItem {
            quantity: Quantity::new(quantity).unwrap(),
            ..LineItem::new(&product(id, "item", cents))
        }
    }

    #[test]
    fn test_repeated_adds_accumulate_on_one_line() {
        let mut cart = Cart::new();
        let first = product(1, "A", 999);
        for _ in 0..4 {
            cart.add_or_increment(&first);
        }

        // Later adds never overwrite the fields captured on the first add.
        let renamed = CartProduct {
            title: "Renamed".to_string(),
            price: Price::from_cents(1),
            ..first.clone()
        };
        let quantity = cart.add_or_increment(&renamed);

        assert_eq!(quantity.get(), 5);
        assert_eq!(cart.len(), 1);
        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.title, "A");
        assert_eq!(item.price, Price::from_cents(999));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        cart.add_or_increment(&product(3, "C", 100));
        cart.add_or_increment(&product(1, "A", 100));
        cart.add_or_increment(&product(3, "C", 100));
        cart.add_or_increment(&product(2, "B", 100));

        let ids: Vec<i64> = cart.iter().map(|item| item.id.as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_set_quantity_missing_id() {
        let mut cart: Cart = [line(1, 100, 2)].into_iter().collect();
        let before = cart.clone();
        assert!(!cart.set_quantity(ProductId::new(9), Quantity::ONE));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_keeps_position() {
        let mut cart: Cart = [line(1, 100, 2), line(2, 100, 1)].into_iter().collect();
        assert!(cart.set_quantity(ProductId::new(1), Quantity::new(7).unwrap()));
        assert_eq!(cart.items()[0].id, ProductId::new(1));
        assert_eq!(cart.items()[0].quantity.get(), 7);
    }

    #[test]
    fn test_remove() {
        let mut cart: Cart = [line(1, 100, 2), line(2, 100, 1)].into_iter().collect();
        assert_eq!(cart.remove(ProductId::new(9)), 0);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.remove(ProductId::new(1)), 1);
        assert_eq!(cart.items()[0].id, ProductId::new(2));
    }

    #[test]
    fn test_total_and_count() {
        let cart: Cart = [line(1, 1000, 2), line(2, 500, 3)].into_iter().collect();
        assert_eq!(cart.total().amount(), Decimal::from(35));
        assert_eq!(cart.item_count(), 5);
        assert_eq!(Cart::new().total(), Price::ZERO);
    }

    #[test]
    fn test_persisted_layout() {
        let mut cart = Cart::new();
        cart.add_or_increment(&product(1, "A", 999));
        assert_eq!(
            cart.encode().unwrap(),
            r#"[{"id":1,"title":"A","price":9.99,"image":"1.png","quantity":1}]"#
        );
    }

    #[test]
    fn test_decode_rejects_corrupt_payloads() {
        assert!(Cart::decode("not json").is_err());
        assert!(Cart::decode("{}").is_err());
        assert!(Cart::decode(r#"[{"id":1,"title":"A","price":1,"image":"x","quantity":0}]"#).is_err());
        assert!(Cart::decode("[]").unwrap().is_empty());
    }
}
