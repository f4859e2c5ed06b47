//! Catalog records
//!
//! Fixed-shape records for the documents stored in the `products`
//! collection and for the caller input of the review mutation. Documents
//! crossing the store boundary are decoded with serde; a document missing a
//! required field is rejected instead of being read as a default.

use chrono::NaiveDate;
use mongodb::bson::{self, Document};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CatalogError, Result};
use crate::utils::date::{ISO_DATE_FORMAT, parse_iso_date};

pub mod report;

pub use report::{
    AffordableProduct, CategoryReport, LowStockProduct, RatingReport, SubcategoryCount,
    TaggedProduct,
};

/// Lowest accepted review rating
pub const MIN_RATING: f64 = 1.0;

/// Highest accepted review rating
pub const MAX_RATING: f64 = 5.0;

/// A catalog product with its embedded reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub specifications: Document,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// A customer review embedded in a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: String,
    pub username: String,
    pub rating: f64,
    pub comment: String,
    pub date: NaiveDate,
}

/// A review submitted by a caller, before validation
///
/// `date` is free text in `YYYY-MM-DD` form; when absent the review is
/// stamped with the clock's current date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub user_id: String,
    pub username: String,
    pub rating: f64,
    pub comment: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl Product {
    /// Check field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.product_id.trim().is_empty() {
            return Err(CatalogError::InvalidArgument(
                "product_id must not be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidArgument(format!(
                "product {}: price must be a non-negative number, got {}",
                self.product_id, self.price
            )));
        }
        if self.stock < 0 {
            return Err(CatalogError::InvalidArgument(format!(
                "product {}: stock must be non-negative, got {}",
                self.product_id, self.stock
            )));
        }
        for review in &self.reviews {
            validate_rating(review.rating)?;
        }
        Ok(())
    }

    /// Convert to the BSON document inserted into the collection
    pub fn to_document(&self) -> Result<Document> {
        bson::to_document(self).map_err(|e| CatalogError::malformed("Product", e))
    }
}

impl Review {
    /// Convert to the BSON document pushed onto `reviews`
    pub fn to_document(&self) -> Result<Document> {
        bson::to_document(self).map_err(|e| CatalogError::malformed("Review", e))
    }
}

impl NewReview {
    /// Validate the input and resolve the review date
    ///
    /// # Arguments
    /// * `clock` - Source of today's date when `date` is absent
    ///
    /// # Returns
    /// * `Result<Review>` - Review ready to append, or `InvalidArgument`
    pub fn into_review(self, clock: &dyn Clock) -> Result<Review> {
        validate_rating(self.rating)?;

        let date = match self.date.as_deref() {
            None => clock.today(),
            Some(text) => parse_iso_date(text).ok_or_else(|| {
                CatalogError::InvalidArgument(format!(
                    "review date must be {ISO_DATE_FORMAT} (YYYY-MM-DD), got '{text}'"
                ))
            })?,
        };

        Ok(Review {
            user_id: self.user_id,
            username: self.username,
            rating: self.rating,
            comment: self.comment,
            date,
        })
    }
}

fn validate_rating(rating: f64) -> Result<()> {
    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(CatalogError::InvalidArgument(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// Decode a store document into a typed record
///
/// # Arguments
/// * `record` - Record name used in the error message
/// * `doc` - Document returned by the store
pub fn decode<T: DeserializeOwned>(record: &'static str, doc: Document) -> Result<T> {
    bson::from_document(doc).map_err(|e| CatalogError::malformed(record, e))
}

/// Decode every document of a result set, failing on the first malformed one
pub fn decode_all<T: DeserializeOwned>(
    record: &'static str,
    docs: Vec<Document>,
) -> Result<Vec<T>> {
    docs.into_iter().map(|doc| decode(record, doc)).collect()
}
