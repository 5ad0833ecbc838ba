//! Cart commands.
//!
//! Every command opens the file store fresh, performs one operation, and
//! exits. Another `arwa` process (for example `arwa watch`) sees the change
//! through the store's change polling.
//!
//! # Usage
//!
//! ```bash
//! # Add a product from the catalog
//! arwa add 1 --catalog products.json
//!
//! # Add a product without a catalog
//! arwa add 1 --title "Backpack" --price 109.95 --image https://example.com/1.jpg
//!
//! # Change quantities
//! arwa set 1 3
//! arwa inc 1
//! arwa dec 1
//!
//! # Inspect and check out
//! arwa show
//! arwa total
//! arwa checkout
//! ```

use std::error::Error;
use std::path::Path;

use arwa_shop_cart::{CartStore, CartSummary, FileStorage, KeyValueStore, badge_label};
use arwa_shop_core::{CartProduct, Price, ProductCatalog, ProductId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::catalog;
use crate::config::CartConfig;

type CommandResult = Result<(), Box<dyn Error>>;

/// Product details given on the command line instead of a catalog lookup.
#[derive(Debug, Clone, Default)]
pub struct ManualProduct {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

/// Resolve the product to add: explicit details win, otherwise the catalog.
async fn resolve_product(
    id: ProductId,
    manual: ManualProduct,
    catalog_path: Option<&Path>,
) -> Result<CartProduct, Box<dyn Error>> {
    if let (Some(title), Some(price)) = (manual.title, manual.price) {
        return Ok(CartProduct {
            id,
            title,
            price: Price::new(price),
            image: manual.image.unwrap_or_default(),
        });
    }

    let catalog = catalog::load(catalog_path).await?;
    let record = catalog
        .product(id)
        .ok_or_else(|| format!("Product {id} not found in catalog"))?;
    Ok(CartProduct::from(record))
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &CartSummary) {
    println!("{summary}");
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
pub fn show(config: &CartConfig) -> CommandResult {
    let store = config.open_store()?;
    print_summary(&store.summary()?);
    Ok(())
}

/// Add one unit of product `id`.
///
/// # Errors
///
/// Returns an error if the product cannot be resolved or the cart cannot be
/// written.
pub async fn add(config: &CartConfig, id: ProductId, manual: ManualProduct) -> CommandResult {
    let store = config.open_store()?;
    let product = resolve_product(id, manual, config.catalog.as_deref()).await?;
    let cart = store.add_or_increment(&product)?;
    info!(product = %product.title, "\"{}\" added to cart", product.title);
    print_summary(&CartSummary::from(&cart));
    Ok(())
}

/// Set the quantity of product `id`.
///
/// # Errors
///
/// Returns an error if the cart cannot be written, or the quantity is invalid
/// under the strict policy.
pub fn set(config: &CartConfig, id: ProductId, quantity: i64) -> CommandResult {
    let store = config.open_store()?;
    report_update(&store, store.set_quantity(id, quantity)?)
}

/// Add one unit to the line for `id`.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
pub fn increment(config: &CartConfig, id: ProductId) -> CommandResult {
    let store = config.open_store()?;
    report_update(&store, store.increment(id)?)
}

/// Take one unit off the line for `id`.
///
/// # Errors
///
/// Returns an error if the cart cannot be written, or the line is already at
/// one unit under the strict policy.
pub fn decrement(config: &CartConfig, id: ProductId) -> CommandResult {
    let store = config.open_store()?;
    report_update(&store, store.decrement(id)?)
}

fn report_update(
    store: &CartStore<FileStorage>,
    updated: Option<arwa_shop_cart::Cart>,
) -> CommandResult {
    match updated {
        Some(cart) => print_summary(&CartSummary::from(&cart)),
        None => {
            warn!("Quantity not changed; use `arwa remove` to drop an item");
            print_summary(&store.summary()?);
        }
    }
    Ok(())
}

/// Remove product `id` from the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
pub fn remove(config: &CartConfig, id: ProductId) -> CommandResult {
    let store = config.open_store()?;
    let cart = store.remove(id)?;
    print_summary(&CartSummary::from(&cart));
    Ok(())
}

/// Print the cart total.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
#[allow(clippy::print_stdout)]
pub fn total(config: &CartConfig) -> CommandResult {
    let store = config.open_store()?;
    println!("{}", store.total()?);
    Ok(())
}

/// Print the badge label.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
#[allow(clippy::print_stdout)]
pub fn count(config: &CartConfig) -> CommandResult {
    let store = config.open_store()?;
    println!("{}", badge_label(store.item_count()?));
    Ok(())
}

/// Acknowledge an order for the current cart. Nothing is submitted.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
#[allow(clippy::print_stdout)]
pub fn checkout(config: &CartConfig) -> CommandResult {
    let store = config.open_store()?;
    match store.checkout()? {
        Some(receipt) => println!("{receipt}"),
        None => println!("{}", arwa_shop_cart::EMPTY_CART_MESSAGE),
    }
    Ok(())
}

/// Delete the stored cart outright, as clearing browser storage would.
///
/// # Errors
///
/// Returns an error if the cart file cannot be removed.
pub fn clear(config: &CartConfig) -> CommandResult {
    let store = config.open_store()?;
    store.storage().remove(store.key())?;
    info!(key = store.key(), "cart cleared");
    Ok(())
}
