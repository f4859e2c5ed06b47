//! Write operations for the catalog service

use mongodb::bson::{Bson, doc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{CatalogError, Result};
use crate::model::{NewReview, Review};

use super::{CatalogReportService, REVIEWS_FIELD};

impl<C: Clock> CatalogReportService<'_, C> {
    /// Append a review to a product
    ///
    /// The review lands at the end of `reviews`. Calling this twice appends
    /// twice; there is no deduplication. Atomicity is that of the store's
    /// single-document update.
    ///
    /// # Arguments
    /// * `product_id` - Target product
    /// * `review` - Review input; a missing date defaults to the clock's today
    ///
    /// # Returns
    /// * `Result<Review>` - The stored review, `NotFound`, or `InvalidArgument`
    pub async fn add_review(&self, product_id: &str, review: NewReview) -> Result<Review> {
        let review = review.into_review(&self.clock)?;
        let value = Bson::Document(review.to_document()?);

        let matched = self
            .store
            .push(doc! { "product_id": product_id }, REVIEWS_FIELD, value)
            .await?;

        if matched == 0 {
            warn!("No product with id '{}', review not added", product_id);
            return Err(CatalogError::NotFound(product_id.to_string()));
        }

        info!(
            "Added review by '{}' to product '{}' dated {}",
            review.username, product_id, review.date
        );
        Ok(review)
    }
}
