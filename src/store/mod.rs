//! Product store capability
//!
//! The catalog service never talks to the driver directly. It goes through
//! [`ProductStore`], the narrow set of collection operations it needs:
//! - filtered find with projection and sort
//! - aggregation pipelines
//! - atomic single-document array push
//! - bulk insert and count (used by the loader)
//!
//! [`MongoProductStore`] implements it over a `mongodb::Collection<Document>`.
//! Unit tests substitute `memory::MemoryProductStore`, which evaluates only
//! the operator subset the service issues.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::error::Result;

#[cfg(test)]
mod eval;
pub mod mongo;

#[cfg(test)]
pub(crate) use memory::MemoryProductStore;
pub use mongo::MongoProductStore;

/// Options for a find request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    /// Fields to include or exclude
    pub projection: Option<Document>,

    /// Sort specification, applied before projection
    pub sort: Option<Document>,
}

impl FindSpec {
    /// Find with a projection and natural order
    pub fn projected(projection: Document) -> Self {
        Self {
            projection: Some(projection),
            sort: None,
        }
    }

    /// Add a sort specification
    pub fn sorted(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Collection operations required by the catalog service
///
/// Every call is a single request against the store; results are fully
/// materialized before returning.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Return all documents matching `filter`
    async fn find(&self, filter: Document, spec: FindSpec) -> Result<Vec<Document>>;

    /// Return the first document matching `filter`
    async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>>;

    /// Run an aggregation pipeline over the collection
    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>>;

    /// Append `value` to the array `field` of the first document matching
    /// `filter`
    ///
    /// # Returns
    /// * `Result<u64>` - Number of matched documents (0 or 1)
    async fn push(&self, filter: Document, field: &str, value: Bson) -> Result<u64>;

    /// Insert documents in order
    ///
    /// # Returns
    /// * `Result<u64>` - Number of inserted documents
    async fn insert_many(&self, documents: Vec<Document>) -> Result<u64>;

    /// Total number of documents in the collection
    async fn count(&self) -> Result<u64>;
}
