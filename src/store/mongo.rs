//! `ProductStore` over a MongoDB collection

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{FindOneOptions, FindOptions};
use tracing::{debug, info};

use crate::error::Result;

use super::{FindSpec, ProductStore};

/// Product store backed by a MongoDB collection handle
///
/// The handle is cheap to clone and shares the client's connection pool.
#[derive(Debug, Clone)]
pub struct MongoProductStore {
    collection: Collection<Document>,
}

impl MongoProductStore {
    /// Wrap an existing collection handle
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// `database.collection` namespace of the wrapped handle
    pub fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn find(&self, filter: Document, spec: FindSpec) -> Result<Vec<Document>> {
        debug!(
            "Executing find on '{}' with filter: {:?}",
            self.namespace(),
            filter
        );

        let mut find_options = FindOptions::default();
        find_options.projection = spec.projection;
        find_options.sort = spec.sort;

        let cursor = self
            .collection
            .find(filter)
            .with_options(find_options)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        debug!("Find returned {} documents", documents.len());
        Ok(documents)
    }

    async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>> {
        debug!(
            "Executing findOne on '{}' with filter: {:?}",
            self.namespace(),
            filter
        );

        let mut options = FindOneOptions::default();
        options.projection = projection;

        Ok(self.collection.find_one(filter).with_options(options).await?)
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        info!(
            "Executing aggregate on '{}' with {} pipeline stages",
            self.namespace(),
            pipeline.len()
        );

        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        info!("Aggregation returned {} documents", documents.len());
        Ok(documents)
    }

    async fn push(&self, filter: Document, field: &str, value: Bson) -> Result<u64> {
        debug!(
            "Executing updateOne $push '{}' on '{}' with filter: {:?}",
            field,
            self.namespace(),
            filter
        );

        let update = doc! { "$push": { field: value } };
        let result = self.collection.update_one(filter, update).await?;

        debug!(
            "updateOne matched {}, modified {}",
            result.matched_count, result.modified_count
        );
        Ok(result.matched_count)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<u64> {
        info!(
            "Executing insertMany on '{}' with {} documents",
            self.namespace(),
            documents.len()
        );

        let result = self.collection.insert_many(documents).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
