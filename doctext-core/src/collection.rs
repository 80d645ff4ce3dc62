//! Collection handles.
//!
//! Every data operation on a [`Collection`] takes its filter, update,
//! replacement or document arguments as JSON text. The text is decoded into
//! BSON documents first; only if every argument decodes is the operation
//! forwarded to the backend.
//!
//! # Example
//!
//! ```ignore
//! let people = client.use_database("test", None).collection("people", None);
//!
//! let inserted = people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await?;
//! let ann = people.find_one(r#"{"name": "Ann"}"#, None).await?;
//!
//! let result = people
//!     .update_one(r#"{"name": "Ann"}"#, r#"{"$set": {"age": 31}}"#, None)
//!     .await?;
//! assert_eq!(result.modified_count, 1);
//! ```

use bson::{Bson, Document, doc};

use crate::{
    backend::{CollectionTarget, DocumentBackend},
    decode::{decode_document, decode_document_list},
    error::{DocTextError, DocTextResult},
    options::{
        CollectionOptions, CountOptions, DeleteOptions, DistinctOptions, EstimatedCountOptions,
        FindOneAndDeleteOptions, FindOneAndModifyOptions, FindOneOptions, FindOptions,
        InsertManyOptions, InsertOneOptions, UpdateOptions,
    },
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

/// A handle to a named collection.
///
/// A handle obtained from [`Database::collection`](crate::database::Database::collection)
/// is bound to the client's backend. [`Collection::default`] yields an unbound
/// handle; every operation on it fails with [`DocTextError::NilCollection`]
/// before any argument is decoded.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The backend type
#[derive(Debug)]
pub struct Collection<'a, B: DocumentBackend> {
    target: CollectionTarget,
    backend: Option<&'a B>,
}

impl<'a, B: DocumentBackend> Default for Collection<'a, B> {
    fn default() -> Self {
        Self { target: CollectionTarget::default(), backend: None }
    }
}

impl<'a, B: DocumentBackend> Collection<'a, B> {
    pub(crate) fn new(target: CollectionTarget, backend: &'a B) -> Self {
        Self { target, backend: Some(backend) }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Returns the name of the database this collection belongs to.
    pub fn database_name(&self) -> &str {
        &self.target.database.name
    }

    /// Returns the options this handle was opened with.
    pub fn options(&self) -> &CollectionOptions {
        &self.target.options
    }

    /// Whether this handle is bound to a backend.
    pub fn is_bound(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> DocTextResult<&'a B> {
        self.backend.ok_or(DocTextError::NilCollection)
    }

    fn no_match(&self) -> DocTextError {
        DocTextError::NoMatch { collection: self.target.name.clone() }
    }

    fn trace(&self, operation: &'static str) {
        tracing::debug!(
            database = %self.target.database.name,
            collection = %self.target.name,
            operation,
            "forwarding collection operation"
        );
    }

    /// Counts the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `filter` is not a JSON object.
    pub async fn count_documents(
        &self,
        filter: &str,
        options: impl Into<Option<CountOptions>>,
    ) -> DocTextResult<u64> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("count_documents");

        backend
            .count_documents(&self.target, filter, options.into().unwrap_or_default())
            .await
    }

    /// Estimates the number of documents in the collection from its metadata.
    ///
    /// No filter is applied.
    pub async fn estimated_document_count(
        &self,
        options: impl Into<Option<EstimatedCountOptions>>,
    ) -> DocTextResult<u64> {
        let backend = self.backend()?;

        self.trace("estimated_document_count");

        backend
            .estimated_document_count(&self.target, options.into().unwrap_or_default())
            .await
    }

    /// Returns every document matching `filter`.
    ///
    /// The cursor is drained before returning; an empty vector means nothing
    /// matched.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `filter` is not a JSON object.
    pub async fn find(
        &self,
        filter: &str,
        options: impl Into<Option<FindOptions>>,
    ) -> DocTextResult<Vec<Document>> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("find");

        backend
            .find(&self.target, filter, options.into().unwrap_or_default())
            .await
    }

    /// Returns one document matching `filter`.
    ///
    /// If several documents match, the first in natural (or `sort`) order is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`DocTextError::NilCollection`] if the handle is unbound
    /// - [`DocTextError::Decode`] if `filter` is not a JSON object
    /// - [`DocTextError::NoMatch`] if no document matched
    pub async fn find_one(
        &self,
        filter: &str,
        options: impl Into<Option<FindOneOptions>>,
    ) -> DocTextResult<Document> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("find_one");

        backend
            .find_one(&self.target, filter, options.into().unwrap_or_default())
            .await?
            .ok_or_else(|| self.no_match())
    }

    /// Deletes one document matching `filter` and returns it as it was before
    /// deletion.
    ///
    /// # Errors
    ///
    /// Returns [`DocTextError::NoMatch`] if no document matched.
    pub async fn find_one_and_delete(
        &self,
        filter: &str,
        options: impl Into<Option<FindOneAndDeleteOptions>>,
    ) -> DocTextResult<Document> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("find_one_and_delete");

        backend
            .find_one_and_delete(&self.target, filter, options.into().unwrap_or_default())
            .await?
            .ok_or_else(|| self.no_match())
    }

    /// Replaces one document matching `filter`.
    ///
    /// Returns the document as it was before replacement unless
    /// `return_document` asks for the new version. The replacement must not
    /// contain update operators; the store rejects it otherwise.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either argument is not a JSON object, and
    /// [`DocTextError::NoMatch`] if no document matched (and no upsert happened).
    pub async fn find_one_and_replace(
        &self,
        filter: &str,
        replacement: &str,
        options: impl Into<Option<FindOneAndModifyOptions>>,
    ) -> DocTextResult<Document> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;
        let replacement = decode_document(replacement)?;

        self.trace("find_one_and_replace");

        backend
            .find_one_and_replace(
                &self.target,
                filter,
                replacement,
                options.into().unwrap_or_default(),
            )
            .await?
            .ok_or_else(|| self.no_match())
    }

    /// Applies `update` to one document matching `filter`.
    ///
    /// Returns the document as it was before the update unless
    /// `return_document` asks for the new version. The update must be a
    /// non-empty document of update operators.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either argument is not a JSON object, and
    /// [`DocTextError::NoMatch`] if no document matched (and no upsert happened).
    pub async fn find_one_and_update(
        &self,
        filter: &str,
        update: &str,
        options: impl Into<Option<FindOneAndModifyOptions>>,
    ) -> DocTextResult<Document> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;
        let update = decode_document(update)?;

        self.trace("find_one_and_update");

        backend
            .find_one_and_update(&self.target, filter, update, options.into().unwrap_or_default())
            .await?
            .ok_or_else(|| self.no_match())
    }

    /// Inserts one document given as JSON text.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `document` is not a JSON object, or a server
    /// error for duplicate keys and validation failures.
    pub async fn insert_one(
        &self,
        document: &str,
        options: impl Into<Option<InsertOneOptions>>,
    ) -> DocTextResult<InsertOneResult> {
        let backend = self.backend()?;
        let document = decode_document(document)?;

        self.trace("insert_one");

        backend
            .insert_one(&self.target, document, options.into().unwrap_or_default())
            .await
    }

    /// Inserts a JSON array of documents.
    ///
    /// Partial failures are reported exactly as the backend reports them;
    /// documents inserted before a failure stay inserted.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `documents` is not a JSON array of objects.
    pub async fn insert_many(
        &self,
        documents: &str,
        options: impl Into<Option<InsertManyOptions>>,
    ) -> DocTextResult<InsertManyResult> {
        let backend = self.backend()?;
        let documents = decode_document_list(documents)?;

        self.trace("insert_many");

        backend
            .insert_many(&self.target, documents, options.into().unwrap_or_default())
            .await
    }

    /// Applies `update` to at most one document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either argument is not a JSON object. An empty
    /// update or one with non-operator keys is rejected by the store.
    pub async fn update_one(
        &self,
        filter: &str,
        update: &str,
        options: impl Into<Option<UpdateOptions>>,
    ) -> DocTextResult<UpdateResult> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;
        let update = decode_document(update)?;

        self.trace("update_one");

        backend
            .update_one(&self.target, filter, update, options.into().unwrap_or_default())
            .await
    }

    /// Applies `update` to every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either argument is not a JSON object.
    pub async fn update_many(
        &self,
        filter: &str,
        update: &str,
        options: impl Into<Option<UpdateOptions>>,
    ) -> DocTextResult<UpdateResult> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;
        let update = decode_document(update)?;

        self.trace("update_many");

        backend
            .update_many(&self.target, filter, update, options.into().unwrap_or_default())
            .await
    }

    /// Applies `update` to the document whose `_id` equals `id`.
    ///
    /// Equivalent to [`update_one`](Self::update_one) with the filter
    /// `{"_id": id}`. The identifier is already typed, so an `ObjectId` or any
    /// other BSON value can be passed directly.
    ///
    /// # Errors
    ///
    /// Returns [`DocTextError::NilIdentifier`] if `id` is null or undefined,
    /// before `update` is decoded.
    pub async fn update_by_id(
        &self,
        id: impl Into<Bson>,
        update: &str,
        options: impl Into<Option<UpdateOptions>>,
    ) -> DocTextResult<UpdateResult> {
        let backend = self.backend()?;
        let id = id.into();

        if matches!(id, Bson::Null | Bson::Undefined) {
            return Err(DocTextError::NilIdentifier);
        }

        let update = decode_document(update)?;

        self.trace("update_by_id");

        backend
            .update_one(
                &self.target,
                doc! { "_id": id },
                update,
                options.into().unwrap_or_default(),
            )
            .await
    }

    /// Replaces at most one document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either argument is not a JSON object. A
    /// replacement containing update operators is rejected by the store.
    pub async fn replace_one(
        &self,
        filter: &str,
        replacement: &str,
        options: impl Into<Option<UpdateOptions>>,
    ) -> DocTextResult<UpdateResult> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;
        let replacement = decode_document(replacement)?;

        self.trace("replace_one");

        backend
            .replace_one(&self.target, filter, replacement, options.into().unwrap_or_default())
            .await
    }

    /// Deletes at most one document matching `filter`.
    pub async fn delete_one(
        &self,
        filter: &str,
        options: impl Into<Option<DeleteOptions>>,
    ) -> DocTextResult<DeleteResult> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("delete_one");

        backend
            .delete_one(&self.target, filter, options.into().unwrap_or_default())
            .await
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many(
        &self,
        filter: &str,
        options: impl Into<Option<DeleteOptions>>,
    ) -> DocTextResult<DeleteResult> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("delete_many");

        backend
            .delete_many(&self.target, filter, options.into().unwrap_or_default())
            .await
    }

    /// Returns the distinct values of `field` among documents matching `filter`.
    ///
    /// Values may be of mixed types.
    pub async fn distinct(
        &self,
        field: &str,
        filter: &str,
        options: impl Into<Option<DistinctOptions>>,
    ) -> DocTextResult<Vec<Bson>> {
        let backend = self.backend()?;
        let filter = decode_document(filter)?;

        self.trace("distinct");

        backend
            .distinct(&self.target, field, filter, options.into().unwrap_or_default())
            .await
    }

    /// Drops the collection and all of its documents.
    ///
    /// # Warning
    ///
    /// There is no confirmation step and the operation cannot be undone.
    pub async fn drop(&self) -> DocTextResult<()> {
        let backend = self.backend()?;

        self.trace("drop_collection");

        backend.drop_collection(&self.target).await
    }
}
