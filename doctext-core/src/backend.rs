//! Backend abstraction the facade forwards decoded operations to.
//!
//! A backend is the capability set the handles need from a document store:
//! commands, catalog listing, counting, finding, find-and-modify, inserting,
//! updating, deleting, distinct values and dropping. The MongoDB backend maps
//! each call onto the driver one-to-one; the in-memory backend evaluates them
//! itself.
//!
//! Arguments reach a backend already decoded. Backends never see text, so a
//! malformed argument can never cause a round trip.
//!
//! # Examples
//!
//! ```ignore
//! use doctext::backend::{DocumentBackend, CollectionTarget};
//! use bson::doc;
//!
//! let target = CollectionTarget::new("shop", "orders");
//! let open = backend
//!     .count_documents(&target, doc! { "status": "open" }, Default::default())
//!     .await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{
    error::DocTextResult,
    options::{
        CollectionOptions, CountOptions, DatabaseOptions, DeleteOptions, DistinctOptions,
        EstimatedCountOptions, FindOneAndDeleteOptions, FindOneAndModifyOptions, FindOneOptions,
        FindOptions, InsertManyOptions, InsertOneOptions, ListCollectionsOptions,
        RunCommandOptions, UpdateOptions,
    },
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

/// A named database together with the options it was opened with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseTarget {
    pub name: String,
    pub options: DatabaseOptions,
}

impl DatabaseTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: DatabaseOptions::default() }
    }

    pub fn with_options(name: impl Into<String>, options: DatabaseOptions) -> Self {
        Self { name: name.into(), options }
    }
}

/// A named collection inside a database, together with its options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionTarget {
    pub database: DatabaseTarget,
    pub name: String,
    pub options: CollectionOptions,
}

impl CollectionTarget {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: DatabaseTarget::new(database),
            name: name.into(),
            options: CollectionOptions::default(),
        }
    }

    /// Returns the `database.collection` namespace string.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database.name, self.name)
    }
}

/// Abstract interface for document stores.
///
/// # Thread Safety
///
/// Implementations must be safe to share between tasks. Handles only ever hold
/// a shared reference to the backend, so any interior state must be
/// synchronized by the implementation itself.
///
/// # Single-document results
///
/// Operations that target at most one document return `Ok(None)` when nothing
/// matched. The handles turn that into [`DocTextError::NoMatch`](crate::error::DocTextError::NoMatch);
/// backends must not report it as an error themselves.
#[async_trait]
pub trait DocumentBackend: Send + Sync + Debug {
    /// Runs an administrative command and returns the reply document.
    async fn run_command(
        &self,
        database: &DatabaseTarget,
        command: Document,
        options: RunCommandOptions,
    ) -> DocTextResult<Document>;

    /// Drops a database and everything in it.
    async fn drop_database(&self, database: &DatabaseTarget) -> DocTextResult<()>;

    /// Lists the catalog entries of the collections matching `filter`.
    async fn list_collections(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<Document>>;

    /// Lists the names of the collections matching `filter`.
    async fn list_collection_names(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<String>>;

    /// Counts the documents matching `filter`.
    async fn count_documents(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: CountOptions,
    ) -> DocTextResult<u64>;

    /// Estimates the number of documents in the collection from its metadata.
    async fn estimated_document_count(
        &self,
        collection: &CollectionTarget,
        options: EstimatedCountOptions,
    ) -> DocTextResult<u64>;

    /// Returns every document matching `filter`.
    async fn find(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOptions,
    ) -> DocTextResult<Vec<Document>>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneOptions,
    ) -> DocTextResult<Option<Document>>;

    /// Deletes the first document matching `filter` and returns it.
    async fn find_one_and_delete(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneAndDeleteOptions,
    ) -> DocTextResult<Option<Document>>;

    /// Replaces the first document matching `filter` and returns the version
    /// selected by `options.return_document`.
    async fn find_one_and_replace(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>>;

    /// Updates the first document matching `filter` and returns the version
    /// selected by `options.return_document`.
    async fn find_one_and_update(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>>;

    async fn insert_one(
        &self,
        collection: &CollectionTarget,
        document: Document,
        options: InsertOneOptions,
    ) -> DocTextResult<InsertOneResult>;

    async fn insert_many(
        &self,
        collection: &CollectionTarget,
        documents: Vec<Document>,
        options: InsertManyOptions,
    ) -> DocTextResult<InsertManyResult>;

    async fn update_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult>;

    async fn update_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult>;

    async fn replace_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult>;

    async fn delete_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: DeleteOptions,
    ) -> DocTextResult<DeleteResult>;

    async fn delete_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: DeleteOptions,
    ) -> DocTextResult<DeleteResult>;

    /// Returns the distinct values of `field` among the documents matching `filter`.
    async fn distinct(
        &self,
        collection: &CollectionTarget,
        field: &str,
        filter: Document,
        options: DistinctOptions,
    ) -> DocTextResult<Vec<Bson>>;

    /// Drops a collection and all of its documents.
    async fn drop_collection(&self, collection: &CollectionTarget) -> DocTextResult<()>;

    /// Releases the backend's resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocTextResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> DocumentBackend for &B
where
    B: DocumentBackend,
{
    async fn run_command(
        &self,
        database: &DatabaseTarget,
        command: Document,
        options: RunCommandOptions,
    ) -> DocTextResult<Document> {
        (*self).run_command(database, command, options).await
    }

    async fn drop_database(&self, database: &DatabaseTarget) -> DocTextResult<()> {
        (*self).drop_database(database).await
    }

    async fn list_collections(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<Document>> {
        (*self).list_collections(database, filter, options).await
    }

    async fn list_collection_names(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<String>> {
        (*self).list_collection_names(database, filter, options).await
    }

    async fn count_documents(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: CountOptions,
    ) -> DocTextResult<u64> {
        (*self).count_documents(collection, filter, options).await
    }

    async fn estimated_document_count(
        &self,
        collection: &CollectionTarget,
        options: EstimatedCountOptions,
    ) -> DocTextResult<u64> {
        (*self).estimated_document_count(collection, options).await
    }

    async fn find(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOptions,
    ) -> DocTextResult<Vec<Document>> {
        (*self).find(collection, filter, options).await
    }

    async fn find_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneOptions,
    ) -> DocTextResult<Option<Document>> {
        (*self).find_one(collection, filter, options).await
    }

    async fn find_one_and_delete(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneAndDeleteOptions,
    ) -> DocTextResult<Option<Document>> {
        (*self).find_one_and_delete(collection, filter, options).await
    }

    async fn find_one_and_replace(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        (*self)
            .find_one_and_replace(collection, filter, replacement, options)
            .await
    }

    async fn find_one_and_update(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        (*self)
            .find_one_and_update(collection, filter, update, options)
            .await
    }

    async fn insert_one(
        &self,
        collection: &CollectionTarget,
        document: Document,
        options: InsertOneOptions,
    ) -> DocTextResult<InsertOneResult> {
        (*self).insert_one(collection, document, options).await
    }

    async fn insert_many(
        &self,
        collection: &CollectionTarget,
        documents: Vec<Document>,
        options: InsertManyOptions,
    ) -> DocTextResult<InsertManyResult> {
        (*self).insert_many(collection, documents, options).await
    }

    async fn update_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        (*self).update_one(collection, filter, update, options).await
    }

    async fn update_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        (*self).update_many(collection, filter, update, options).await
    }

    async fn replace_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        (*self)
            .replace_one(collection, filter, replacement, options)
            .await
    }

    async fn delete_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: DeleteOptions,
    ) -> DocTextResult<DeleteResult> {
        (*self).delete_one(collection, filter, options).await
    }

    async fn delete_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: DeleteOptions,
    ) -> DocTextResult<DeleteResult> {
        (*self).delete_many(collection, filter, options).await
    }

    async fn distinct(
        &self,
        collection: &CollectionTarget,
        field: &str,
        filter: Document,
        options: DistinctOptions,
    ) -> DocTextResult<Vec<Bson>> {
        (*self).distinct(collection, field, filter, options).await
    }

    async fn drop_collection(&self, collection: &CollectionTarget) -> DocTextResult<()> {
        (*self).drop_collection(collection).await
    }
}

/// Factory trait for creating backend instances.
///
/// Building a backend is where connection setup happens; a builder that
/// returns successfully hands back a backend that is ready for use.
#[async_trait]
pub trait BackendBuilder {
    type Backend: DocumentBackend;

    async fn build(self) -> DocTextResult<Self::Backend>;
}
