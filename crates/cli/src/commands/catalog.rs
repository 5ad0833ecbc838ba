//! Product catalog commands.
//!
//! The catalog is a JSON file in the format the product API returns
//! (`GET /products`): an array of `{id, title, price, description, category,
//! image}` records. Save it once and point `ARWA_CATALOG` (or `--catalog`) at it.
//!
//! # Usage
//!
//! ```bash
//! arwa products --catalog products.json
//! arwa products --catalog products.json --category jewelery
//!
//! # Products in the same category as product 5
//! arwa related 5 --catalog products.json
//! ```

use std::path::{Path, PathBuf};

use arwa_shop_core::{ProductCatalog, ProductId, ProductRecord, StaticCatalog};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No catalog configured; pass --catalog or set ARWA_CATALOG")]
    NotConfigured,

    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog {path} is not a product list: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Product {0} not found in catalog")]
    UnknownProduct(ProductId),
}

/// Load the catalog at `path`.
///
/// # Errors
///
/// Returns `CatalogError` if no path is configured, or the file cannot be read
/// or parsed.
pub async fn load(path: Option<&Path>) -> Result<StaticCatalog, CatalogError> {
    let path = path.ok_or(CatalogError::NotConfigured)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let catalog = StaticCatalog::from_json(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), products = catalog.products().len(), "catalog loaded");
    Ok(catalog)
}

/// List catalog products, optionally limited to one category.
///
/// # Errors
///
/// Returns `CatalogError` if the catalog cannot be loaded.
pub async fn list(path: Option<&Path>, category: Option<&str>) -> Result<(), CatalogError> {
    let catalog = load(path).await?;
    info!(categories = ?catalog.categories(), "catalog categories");

    for record in catalog
        .products()
        .iter()
        .filter(|record| category.is_none_or(|c| record.category == c))
    {
        print_record(record);
    }
    Ok(())
}

/// List the products related to `id`: same category, `id` itself excluded.
///
/// # Errors
///
/// Returns `CatalogError` if the catalog cannot be loaded or has no product
/// `id`.
#[allow(clippy::print_stdout)]
pub async fn related(path: Option<&Path>, id: ProductId) -> Result<(), CatalogError> {
    let catalog = load(path).await?;
    if catalog.product(id).is_none() {
        return Err(CatalogError::UnknownProduct(id));
    }

    let related = catalog.related(id);
    if related.is_empty() {
        println!("No related products.");
    }
    for record in related {
        print_record(record);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_record(record: &ProductRecord) {
    println!(
        "#{:<5} {:<50} {:>10}  [{}]",
        record.id, record.title, record.price, record.category
    );
}
