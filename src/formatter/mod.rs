//! Output formatting for report results
//!
//! Reports render either as a table or as a JSON array (compact or
//! pretty-printed). Each report row type declares its column headers and
//! cell text through [`ReportRow`].

use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::{CatalogError, Result};
use crate::model::{
    AffordableProduct, CategoryReport, LowStockProduct, RatingReport, Review, SubcategoryCount,
    TaggedProduct,
};
use crate::utils::date::ISO_DATE_FORMAT;
use crate::utils::number::format_number;

pub mod table;

pub use table::TableFormatter;

/// A record that can be printed as a table row
pub trait ReportRow: Serialize {
    /// Column headers, in cell order
    const HEADERS: &'static [&'static str];

    /// Cell text for this row
    fn cells(&self) -> Vec<String>;
}

/// Main formatter for report output
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Renderer used for `OutputFormat::Table`
    table: TableFormatter,
}

impl Formatter {
    /// Create a new formatter
    pub fn new(format_type: OutputFormat) -> Self {
        Self {
            format_type,
            table: TableFormatter::new(),
        }
    }

    /// Wrap table cells wider than `width` characters
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.table = self.table.with_max_column_width(width);
        self
    }

    /// Format report rows according to the configured format
    ///
    /// # Returns
    /// * `Result<String>` - Rendered rows, or `Generic` if JSON encoding fails
    pub fn format<T: ReportRow>(&self, rows: &[T]) -> Result<String> {
        match self.format_type {
            OutputFormat::Table => Ok(self.table.format(rows)),
            OutputFormat::Json => serde_json::to_string(rows).map_err(json_error),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(rows).map_err(json_error),
        }
    }

    /// Format a single record, such as a stored review
    pub fn format_one<T: ReportRow>(&self, row: &T) -> Result<String> {
        match self.format_type {
            OutputFormat::Table => Ok(self.table.format(std::slice::from_ref(row))),
            OutputFormat::Json => serde_json::to_string(row).map_err(json_error),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(row).map_err(json_error),
        }
    }
}

fn json_error(e: serde_json::Error) -> CatalogError {
    CatalogError::Generic(format!("JSON encoding failed: {e}"))
}

impl ReportRow for AffordableProduct {
    const HEADERS: &'static [&'static str] = &["name", "price", "stock"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format_number(self.price),
            self.stock.to_string(),
        ]
    }
}

impl ReportRow for RatingReport {
    const HEADERS: &'static [&'static str] = &[
        "product_id",
        "product_name",
        "category",
        "avg_rating",
        "review_count",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.product_id.clone(),
            self.product_name.clone(),
            self.category.clone(),
            format!("{:.2}", self.avg_rating),
            self.review_count.to_string(),
        ]
    }
}

impl ReportRow for CategoryReport {
    const HEADERS: &'static [&'static str] = &[
        "category",
        "avg_price",
        "product_count",
        "min_price",
        "max_price",
        "price_range",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.category.clone(),
            format!("{:.2}", self.avg_price),
            self.product_count.to_string(),
            format_number(self.min_price),
            format_number(self.max_price),
            self.price_range.clone(),
        ]
    }
}

impl ReportRow for LowStockProduct {
    const HEADERS: &'static [&'static str] = &["name", "stock", "category"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.stock.to_string(),
            self.category.clone(),
        ]
    }
}

impl ReportRow for TaggedProduct {
    const HEADERS: &'static [&'static str] = &["name", "price", "ram"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format_number(self.price),
            self.ram.clone().unwrap_or_default(),
        ]
    }
}

impl ReportRow for SubcategoryCount {
    const HEADERS: &'static [&'static str] = &["subcategory", "count"];

    fn cells(&self) -> Vec<String> {
        vec![self.subcategory.clone(), self.count.to_string()]
    }
}

impl ReportRow for Review {
    const HEADERS: &'static [&'static str] = &["user_id", "username", "rating", "comment", "date"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.username.clone(),
            format_number(self.rating),
            self.comment.clone(),
            self.date.format(ISO_DATE_FORMAT).to_string(),
        ]
    }
}
