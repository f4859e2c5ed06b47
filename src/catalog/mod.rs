//! Catalog report service
//!
//! This module provides [`CatalogReportService`], which turns the fixed set
//! of FlexiMart business questions into store queries and returns typed,
//! ordered results:
//! - Read: affordable products, low stock, tag lookup, product reviews
//! - Aggregate: top-rated products, category price summary, subcategory counts
//! - Write: append a review
//!
//! The service borrows its store and never caches catalog data; every call
//! is one request against the store.
//!
//! Results with equal sort keys are ordered by a secondary key so output is
//! deterministic: `product_id` for ratings and stock, the group key for
//! category and subcategory summaries.

use crate::clock::{Clock, SystemClock};
use crate::error::{CatalogError, Result};
use crate::store::ProductStore;

// Sub-modules
mod aggregate;
mod read;
mod write;


/// Default minimum mean rating for the top-rated report
pub const DEFAULT_MIN_AVERAGE_RATING: f64 = 4.0;

/// Default stock threshold for the low-stock report
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 50;

/// Category queried by the affordable-products report when none is given
pub const DEFAULT_CATEGORY: &str = "Electronics";

/// Price ceiling used by the affordable-products report when none is given
pub const DEFAULT_PRICE_CEILING: f64 = 50_000.0;

/// Decimal places kept in reported averages
const REPORT_DECIMALS: i32 = 2;

/// Array field holding a product's reviews
const REVIEWS_FIELD: &str = "reviews";

/// Report and mutation operations over the `products` collection
pub struct CatalogReportService<'a, C: Clock = SystemClock> {
    /// Externally owned store handle
    store: &'a dyn ProductStore,

    /// Source of the default review date
    clock: C,
}

impl<'a> CatalogReportService<'a, SystemClock> {
    /// Create a service using the system clock
    ///
    /// # Arguments
    /// * `store` - Product store the service queries
    pub fn new(store: &'a dyn ProductStore) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<'a, C: Clock> CatalogReportService<'a, C> {
    /// Create a service with an explicit clock
    pub fn with_clock(store: &'a dyn ProductStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// The store this service reads from and writes through
    pub fn store(&self) -> &'a dyn ProductStore {
        self.store
    }
}

/// Reject negative or non-finite numeric parameters
fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidArgument(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}
