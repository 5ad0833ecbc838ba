//! Display-ready views of a cart: the cart page summary and the checkout
//! acknowledgment.

use std::fmt;

use arwa_shop_core::{Price, ProductId};
use serde::Serialize;

use crate::cart::{Cart, LineItem};

/// Shown instead of a summary when the cart has no lines.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// Acknowledgment shown on checkout. No order is actually placed.
pub const CHECKOUT_MESSAGE: &str = "Thank you for your order! (ordering is not available yet)";

/// One cart line with its subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub subtotal: Price,
}

impl From<&LineItem> for SummaryLine {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            image: item.image.clone(),
            unit_price: item.price,
            quantity: item.quantity.get(),
            subtotal: item.subtotal(),
        }
    }
}

/// Cart page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    pub item_count: u64,
    pub total: Price,
}

impl CartSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.iter().map(SummaryLine::from).collect(),
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

impl fmt::Display for CartSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(EMPTY_CART_MESSAGE);
        }
        for line in &self.lines {
            writeln!(
                f,
                "#{:<5} {:<40} {:>10} x {:<4} {:>10}",
                line.id, line.title, line.unit_price, line.quantity, line.subtotal
            )?;
        }
        write!(f, "Total: {}", self.total)
    }
}

/// Acknowledgment of a (stubbed) checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub item_count: u64,
    pub total: Price,
    pub message: &'static str,
}

impl CheckoutReceipt {
    pub(crate) fn for_cart(cart: &Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            total: cart.total(),
            message: CHECKOUT_MESSAGE,
        }
    }
}

impl fmt::Display for CheckoutReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} items, {})", self.message, self.item_count, self.total)
    }
}
