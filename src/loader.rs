//! Bulk import of a catalog file
//!
//! A catalog file is a JSON array of product objects. Every product is
//! checked before anything is written, so a bad file inserts nothing.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::model::Product;
use crate::store::ProductStore;

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Documents inserted by this load
    pub inserted: u64,

    /// Documents in the collection afterwards
    pub total: u64,
}

/// Read and validate a catalog file
pub fn read_catalog_file<P: AsRef<Path>>(path: P) -> Result<Vec<Product>> {
    let path = path.as_ref();
    debug!("Reading catalog from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse and validate catalog JSON text
///
/// # Returns
/// * `Result<Vec<Product>>` - Products in file order; `MalformedDocument` for
///   undecodable entries, `InvalidArgument` for empty catalogs, bad values or
///   duplicate `product_id`s
pub fn parse_catalog(content: &str) -> Result<Vec<Product>> {
    let products: Vec<Product> =
        serde_json::from_str(content).map_err(|e| CatalogError::malformed("Product", e))?;

    if products.is_empty() {
        return Err(CatalogError::InvalidArgument(
            "catalog contains no products".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(products.len());
    for product in &products {
        product.validate()?;
        if !seen.insert(product.product_id.as_str()) {
            return Err(CatalogError::InvalidArgument(format!(
                "duplicate product_id '{}'",
                product.product_id
            )));
        }
    }

    Ok(products)
}

/// Insert products into the store in order
pub async fn load_products(store: &dyn ProductStore, products: &[Product]) -> Result<LoadSummary> {
    let docs = products
        .iter()
        .map(Product::to_document)
        .collect::<Result<Vec<_>>>()?;

    let inserted = store.insert_many(docs).await?;
    let total = store.count().await?;

    info!("Loaded {} products, collection now holds {}", inserted, total);
    Ok(LoadSummary { inserted, total })
}

/// Read a catalog file and insert it into the store
pub async fn load_catalog_file<P: AsRef<Path>>(
    store: &dyn ProductStore,
    path: P,
) -> Result<LoadSummary> {
    let products = read_catalog_file(path)?;
    load_products(store, &products).await
}
