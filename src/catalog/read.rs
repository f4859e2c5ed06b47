//! Read operations for the catalog service
//!
//! - affordable products in a category
//! - low-stock products
//! - products carrying a tag
//! - reviews of one product

use mongodb::bson::doc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{CatalogError, Result};
use crate::model::{
    AffordableProduct, LowStockProduct, Review, TaggedProduct, decode, decode_all,
};
use crate::store::FindSpec;

use super::{CatalogReportService, REVIEWS_FIELD, require_non_negative};

#[derive(Deserialize)]
struct ReviewsRow {
    #[serde(default)]
    reviews: Vec<Review>,
}

impl<C: Clock> CatalogReportService<'_, C> {
    /// Products in `category` priced strictly below `price_ceiling`
    ///
    /// Only `name`, `price` and `stock` are returned, in the store's natural
    /// order. An empty category yields an empty result without a query.
    ///
    /// # Arguments
    /// * `category` - Exact category name
    /// * `price_ceiling` - Exclusive upper price bound
    ///
    /// # Returns
    /// * `Result<Vec<AffordableProduct>>` - Matching products or error
    pub async fn find_affordable_products(
        &self,
        category: &str,
        price_ceiling: f64,
    ) -> Result<Vec<AffordableProduct>> {
        require_non_negative("price ceiling", price_ceiling)?;

        if category.is_empty() {
            debug!("Empty category requested, skipping query");
            return Ok(Vec::new());
        }

        let filter = doc! {
            "category": category,
            "price": { "$lt": price_ceiling },
        };
        let projection = doc! { "_id": 0, "name": 1, "price": 1, "stock": 1 };

        let docs = self
            .store
            .find(filter, FindSpec::projected(projection))
            .await?;
        let products: Vec<AffordableProduct> = decode_all("AffordableProduct", docs)?;

        info!(
            "Found {} '{}' products under {}",
            products.len(),
            category,
            price_ceiling
        );
        Ok(products)
    }

    /// Products with `stock` strictly below `threshold`, lowest stock first
    ///
    /// # Arguments
    /// * `threshold` - Exclusive upper stock bound
    ///
    /// # Returns
    /// * `Result<Vec<LowStockProduct>>` - Products sorted ascending by stock
    pub async fn low_stock_products(&self, threshold: i64) -> Result<Vec<LowStockProduct>> {
        if threshold < 0 {
            return Err(CatalogError::InvalidArgument(format!(
                "stock threshold must be non-negative, got {threshold}"
            )));
        }

        let filter = doc! { "stock": { "$lt": threshold } };
        let spec = FindSpec::projected(doc! { "_id": 0, "name": 1, "stock": 1, "category": 1 })
            .sorted(doc! { "stock": 1, "product_id": 1 });

        let docs = self.store.find(filter, spec).await?;
        let products: Vec<LowStockProduct> = decode_all("LowStockProduct", docs)?;

        info!("Found {} products with stock below {}", products.len(), threshold);
        Ok(products)
    }

    /// Products tagged with `tag`, with their RAM specification if any
    pub async fn products_with_tag(&self, tag: &str) -> Result<Vec<TaggedProduct>> {
        if tag.is_empty() {
            return Ok(Vec::new());
        }

        let filter = doc! { "tags": tag };
        let projection = doc! { "_id": 0, "name": 1, "price": 1, "specifications.ram": 1 };

        let docs = self
            .store
            .find(filter, FindSpec::projected(projection))
            .await?;
        let products: Vec<TaggedProduct> = decode_all("TaggedProduct", docs)?;

        info!("Found {} products tagged '{}'", products.len(), tag);
        Ok(products)
    }

    /// Reviews of one product, in insertion order
    ///
    /// # Returns
    /// * `Result<Vec<Review>>` - Stored reviews, or `NotFound`
    pub async fn product_reviews(&self, product_id: &str) -> Result<Vec<Review>> {
        let filter = doc! { "product_id": product_id };
        let projection = doc! { "_id": 0, REVIEWS_FIELD: 1 };

        let doc = self
            .store
            .find_one(filter, Some(projection))
            .await?
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))?;

        let row: ReviewsRow = decode("Review", doc)?;
        Ok(row.reviews)
    }
}
