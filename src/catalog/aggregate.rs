//! Aggregation reports for the catalog service
//!
//! Each report is a single pipeline. Averages are compared at full precision
//! and only rounded in the final `$project`.

use mongodb::bson::{Document, doc};
use tracing::info;

use crate::clock::Clock;
use crate::error::Result;
use crate::model::{CategoryReport, RatingReport, SubcategoryCount, decode_all};

use super::{CatalogReportService, REPORT_DECIMALS, require_non_negative};

/// Pipeline for the top-rated report
///
/// Products without reviews are dropped by `$unwind`, so their undefined
/// mean never reaches `$match`.
pub(super) fn top_rated_pipeline(min_average: f64) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$reviews" },
        doc! {
            "$group": {
                "_id": "$product_id",
                "product_name": { "$first": "$name" },
                "category": { "$first": "$category" },
                "avg_rating": { "$avg": "$reviews.rating" },
                "review_count": { "$sum": 1 },
            }
        },
        doc! { "$match": { "avg_rating": { "$gte": min_average } } },
        doc! { "$sort": { "avg_rating": -1, "_id": 1 } },
        doc! {
            "$project": {
                "_id": 0,
                "product_id": "$_id",
                "product_name": 1,
                "category": 1,
                "avg_rating": { "$round": ["$avg_rating", REPORT_DECIMALS] },
                "review_count": 1,
            }
        },
    ]
}

/// Pipeline for the category price summary
pub(super) fn category_summary_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": "$category",
                "avg_price": { "$avg": "$price" },
                "product_count": { "$sum": 1 },
                "min_price": { "$min": "$price" },
                "max_price": { "$max": "$price" },
            }
        },
        doc! { "$sort": { "avg_price": -1, "_id": 1 } },
        doc! {
            "$project": {
                "_id": 0,
                "category": "$_id",
                "avg_price": { "$round": ["$avg_price", REPORT_DECIMALS] },
                "product_count": 1,
                "min_price": 1,
                "max_price": 1,
                "price_range": {
                    "$concat": [
                        "Rs. ",
                        { "$toString": "$min_price" },
                        " - Rs. ",
                        { "$toString": "$max_price" },
                    ]
                },
            }
        },
    ]
}

/// Pipeline for the per-subcategory product count
pub(super) fn subcategory_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$subcategory", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
        doc! { "$project": { "_id": 0, "subcategory": "$_id", "count": 1 } },
    ]
}

impl<C: Clock> CatalogReportService<'_, C> {
    /// Products whose mean review rating is at least `min_average`
    ///
    /// Sorted by mean rating descending, then `product_id` ascending.
    /// Products without reviews never appear.
    ///
    /// # Arguments
    /// * `min_average` - Inclusive lower bound, compared before rounding
    ///
    /// # Returns
    /// * `Result<Vec<RatingReport>>` - Rating summaries or error
    pub async fn find_top_rated_products(&self, min_average: f64) -> Result<Vec<RatingReport>> {
        require_non_negative("minimum average rating", min_average)?;

        let docs = self.store.aggregate(top_rated_pipeline(min_average)).await?;
        let reports: Vec<RatingReport> = decode_all("RatingReport", docs)?;

        info!(
            "Found {} products rated {} or higher",
            reports.len(),
            min_average
        );
        Ok(reports)
    }

    /// Mean, minimum and maximum price per category
    ///
    /// Sorted by mean price descending, then category ascending. Only
    /// categories with at least one product appear.
    pub async fn category_price_summary(&self) -> Result<Vec<CategoryReport>> {
        let docs = self.store.aggregate(category_summary_pipeline()).await?;
        let reports: Vec<CategoryReport> = decode_all("CategoryReport", docs)?;

        info!("Summarized prices for {} categories", reports.len());
        Ok(reports)
    }

    /// Number of products per subcategory, largest first
    pub async fn subcategory_counts(&self) -> Result<Vec<SubcategoryCount>> {
        let docs = self.store.aggregate(subcategory_pipeline()).await?;
        decode_all("SubcategoryCount", docs)
    }
}
