//! Report records returned by the catalog service

use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

use crate::utils::convert::bson_to_string;

/// Row of the affordable-products report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordableProduct {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

/// Per-product rating summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingReport {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    /// Mean rating, rounded to 2 decimal places
    pub avg_rating: f64,
    pub review_count: u64,
}

/// Per-category price summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    /// Mean price, rounded to 2 decimal places
    pub avg_price: f64,
    pub product_count: u64,
    pub min_price: f64,
    pub max_price: f64,
    /// `Rs. <min> - Rs. <max>`
    pub price_range: String,
}

/// Row of the low-stock report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockProduct {
    pub name: String,
    pub stock: i64,
    pub category: String,
}

/// Row of the tag lookup, with the RAM specification lifted out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaggedRow")]
pub struct TaggedProduct {
    pub name: String,
    pub price: f64,
    pub ram: Option<String>,
}

/// Product count for one subcategory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryCount {
    pub subcategory: String,
    pub count: u64,
}

/// Shape of a tag lookup document as projected by the store
#[derive(Deserialize)]
struct TaggedRow {
    name: String,
    price: f64,
    #[serde(default)]
    specifications: Document,
}

impl From<TaggedRow> for TaggedProduct {
    fn from(row: TaggedRow) -> Self {
        Self {
            name: row.name,
            price: row.price,
            ram: row.specifications.get("ram").map(bson_to_string),
        }
    }
}
