//! In-memory storage implementation of the document backend.
//!
//! This module provides a backend that keeps every database in process
//! memory, guarded by async-aware read-write locks. It evaluates filters,
//! updates, sorts and projections itself and reports failures with the same
//! server error codes MongoDB uses, which makes it a faithful stand-in for
//! tests and local development.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, doc};

use doctext_core::{
    backend::{BackendBuilder, CollectionTarget, DatabaseTarget, DocumentBackend},
    error::{DocTextError, DocTextResult},
    options::{
        CountOptions, DeleteOptions, DistinctOptions, EstimatedCountOptions,
        FindOneAndDeleteOptions, FindOneAndModifyOptions, FindOneOptions, FindOptions,
        InsertManyOptions, InsertOneOptions, ListCollectionsOptions, ReturnDocument,
        RunCommandOptions, UpdateOptions,
    },
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

use crate::{
    evaluator::{self, BAD_VALUE, DocumentEvaluator, total_cmp, values_equal},
    update::{
        apply_update, project, replace_document, seed_from_filter, validate_projection,
        validate_replacement, validate_update, with_id_first,
    },
};

pub(crate) const NAMESPACE_NOT_FOUND: i32 = 26;
pub(crate) const NAMESPACE_EXISTS: i32 = 48;
pub(crate) const COMMAND_NOT_FOUND: i32 = 59;
pub(crate) const DUPLICATE_KEY: i32 = 11000;

type CollectionData = Vec<Document>;
type DatabaseMap = HashMap<String, CollectionData>;
type StoreMap = HashMap<String, DatabaseMap>;

/// Thread-safe in-memory document backend.
///
/// Documents are kept per database and collection in insertion order.
/// Collections are created implicitly by the first insert or upsert, just
/// like on a server.
///
/// # Thread Safety
///
/// `InMemoryBackend` is cloneable and wraps its state in an `Arc`, so clones
/// share the same data and can be moved freely across tasks. Reads take a
/// shared lock; writes take an exclusive one, which makes every single
/// operation atomic.
///
/// # Performance
///
/// There are no indexes; every query scans the collection.
///
/// # Example
///
/// ```ignore
/// use doctext::{prelude::*, memory::InMemoryBackend};
///
/// let client = DocumentClient::new(InMemoryBackend::new());
/// let people = client.use_database("test", None).collection("people", None);
///
/// people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await?;
/// assert_eq!(people.count_documents(r#"{"age": {"$gte": 18}}"#, None).await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBackend {
    /// database name -> collection name -> documents
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder, for symmetry with backends that need to connect.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder
    }
}

fn collection_ref<'s>(store: &'s StoreMap, target: &CollectionTarget) -> &'s [Document] {
    store
        .get(&target.database.name)
        .and_then(|database| database.get(&target.name))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn existing_mut<'s>(store: &'s mut StoreMap, target: &CollectionTarget) -> Option<&'s mut CollectionData> {
    store
        .get_mut(&target.database.name)
        .and_then(|database| database.get_mut(&target.name))
}

fn collection_mut<'s>(store: &'s mut StoreMap, target: &CollectionTarget) -> &'s mut CollectionData {
    store
        .entry(target.database.name.clone())
        .or_default()
        .entry(target.name.clone())
        .or_default()
}

/// Indices of the documents matching `filter`, ordered by `sort` if given.
fn matching(documents: &[Document], filter: &Document, sort: Option<&Document>) -> DocTextResult<Vec<usize>> {
    let evaluator = DocumentEvaluator::new(filter);
    let mut indices = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        if evaluator.matches(document)? {
            indices.push(index);
        }
    }

    if let Some(sort) = sort {
        validate_sort(sort)?;
        indices.sort_by(|a, b| compare_by(&documents[*a], &documents[*b], sort));
    }

    Ok(indices)
}

fn validate_sort(sort: &Document) -> DocTextResult<()> {
    for (key, direction) in sort {
        match evaluator::number(direction) {
            Some(d) if d == 1.0 || d == -1.0 => {},
            _ => {
                return Err(DocTextError::server_with_code(
                    BAD_VALUE,
                    format!("invalid sort direction for '{key}', expected 1 or -1"),
                ));
            },
        }
    }
    Ok(())
}

fn sort_key(document: &Document, path: &str) -> Bson {
    evaluator::resolve(document, path)
        .first()
        .map(|value| (*value).clone())
        .unwrap_or(Bson::Null)
}

fn compare_by(left: &Document, right: &Document, sort: &Document) -> Ordering {
    for (key, direction) in sort {
        let ordering = total_cmp(&sort_key(left, key), &sort_key(right, key));
        let ordering = match evaluator::number(direction) {
            Some(d) if d < 0.0 => ordering.reverse(),
            _ => ordering,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn projected(document: &Document, projection: Option<&Document>) -> DocTextResult<Document> {
    match projection {
        Some(projection) => project(document, projection),
        None => Ok(document.clone()),
    }
}

fn duplicate_key(target: &CollectionTarget, id: &Bson) -> DocTextError {
    DocTextError::server_with_code(
        DUPLICATE_KEY,
        format!(
            "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: {id} }}",
            target.namespace(),
        ),
    )
}

/// Appends a document, assigning an `_id` if needed and enforcing uniqueness.
fn insert_document(documents: &mut CollectionData, target: &CollectionTarget, document: Document) -> DocTextResult<Bson> {
    let document = with_id_first(document);
    let id = document.get("_id").cloned().unwrap_or(Bson::Null);

    if documents
        .iter()
        .any(|existing| existing.get("_id").is_some_and(|existing| values_equal(existing, &id)))
    {
        return Err(duplicate_key(target, &id));
    }

    documents.push(document);
    Ok(id)
}

fn catalog_entry(name: &str) -> Document {
    doc! {
        "name": name,
        "type": "collection",
        "options": {},
        "info": { "readOnly": false },
    }
}

fn catalog(store: &StoreMap, database: &DatabaseTarget, filter: &Document) -> DocTextResult<Vec<Document>> {
    let mut names = store
        .get(&database.name)
        .map(|collections| collections.keys().cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    names.sort();

    let evaluator = DocumentEvaluator::new(filter);
    let mut entries = Vec::with_capacity(names.len());

    for name in names {
        let entry = catalog_entry(&name);
        if evaluator.matches(&entry)? {
            entries.push(entry);
        }
    }

    Ok(entries)
}

fn count(value: usize) -> Bson {
    Bson::Int64(value as i64)
}

impl InMemoryBackend {
    async fn update(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        multi: bool,
    ) -> DocTextResult<UpdateResult> {
        validate_update(&update)?;

        let mut store = self.store.write().await;
        let mut result = UpdateResult::default();

        if let Some(documents) = existing_mut(&mut store, collection) {
            let mut indices = matching(documents, &filter, None)?;
            if !multi {
                indices.truncate(1);
            }

            for index in indices {
                let mut updated = documents[index].clone();
                apply_update(&mut updated, &update, false)?;

                result.matched_count += 1;
                if updated != documents[index] {
                    documents[index] = updated;
                    result.modified_count += 1;
                }
            }
        }

        if result.matched_count == 0 && options.upsert.unwrap_or(false) {
            let mut seeded = seed_from_filter(&filter)?;
            apply_update(&mut seeded, &update, true)?;
            let id = insert_document(collection_mut(&mut store, collection), collection, seeded)?;
            result.upserted_id = Some(id);
        }

        Ok(result)
    }

    async fn delete(&self, collection: &CollectionTarget, filter: Document, multi: bool) -> DocTextResult<DeleteResult> {
        let mut store = self.store.write().await;
        let Some(documents) = existing_mut(&mut store, collection) else {
            return Ok(DeleteResult::default());
        };

        let mut indices = matching(documents, &filter, None)?;
        if !multi {
            indices.truncate(1);
        }

        for index in indices.iter().rev() {
            documents.remove(*index);
        }

        Ok(DeleteResult { deleted_count: indices.len() as u64 })
    }

    /// Shared find-and-modify path for replacements and updates.
    async fn find_and_modify(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        modification: Modification,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        let projection = options.projection.as_ref();
        if let Some(projection) = projection {
            validate_projection(projection)?;
        }

        let mut store = self.store.write().await;

        if let Some(documents) = existing_mut(&mut store, collection) {
            if let Some(index) = matching(documents, &filter, options.sort.as_ref())?.first().copied() {
                let before = documents[index].clone();
                let after = modification.apply(&before)?;
                documents[index] = after.clone();

                let returned = match options.return_document {
                    ReturnDocument::Before => before,
                    ReturnDocument::After => after,
                };
                return projected(&returned, projection).map(Some);
            }
        }

        if !options.upsert.unwrap_or(false) {
            return Ok(None);
        }

        let inserted = with_id_first(modification.seed(&filter)?);
        insert_document(collection_mut(&mut store, collection), collection, inserted.clone())?;

        match options.return_document {
            ReturnDocument::Before => Ok(None),
            ReturnDocument::After => projected(&inserted, projection).map(Some),
        }
    }
}

/// A change applied by a find-and-modify operation.
enum Modification {
    Replace(Document),
    Update(Document),
}

impl Modification {
    fn apply(&self, existing: &Document) -> DocTextResult<Document> {
        match self {
            Modification::Replace(replacement) => replace_document(existing, replacement),
            Modification::Update(update) => {
                let mut updated = existing.clone();
                apply_update(&mut updated, update, false)?;
                Ok(updated)
            },
        }
    }

    /// The document inserted when an upsert finds nothing.
    fn seed(&self, filter: &Document) -> DocTextResult<Document> {
        match self {
            Modification::Replace(replacement) => upsert_replacement(filter, replacement),
            Modification::Update(update) => {
                let mut seeded = seed_from_filter(filter)?;
                apply_update(&mut seeded, update, true)?;
                Ok(seeded)
            },
        }
    }
}

/// A replacement inserted by an upsert takes its `_id` from the filter when
/// the replacement has none.
fn upsert_replacement(filter: &Document, replacement: &Document) -> DocTextResult<Document> {
    let mut inserted = replacement.clone();

    if !inserted.contains_key("_id") {
        if let Some(id) = seed_from_filter(filter)?.get("_id") {
            inserted.insert("_id", id.clone());
        }
    }

    Ok(inserted)
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn run_command(
        &self,
        database: &DatabaseTarget,
        command: Document,
        _options: RunCommandOptions,
    ) -> DocTextResult<Document> {
        let Some((name, argument)) = command.iter().next() else {
            return Err(DocTextError::server_with_code(COMMAND_NOT_FOUND, "no such command: ''"));
        };

        match name.as_str() {
            "ping" | "isMaster" | "hello" => Ok(doc! { "ok": 1.0 }),
            "buildInfo" | "buildinfo" => Ok(doc! {
                "version": env!("CARGO_PKG_VERSION"),
                "storageEngines": ["memory"],
                "ok": 1.0,
            }),
            "listCollections" => {
                let filter = command.get_document("filter").ok().cloned().unwrap_or_default();
                let store = self.store.read().await;
                let entries = catalog(&store, database, &filter)?;

                Ok(doc! {
                    "cursor": {
                        "id": 0_i64,
                        "ns": format!("{}.$cmd.listCollections", database.name),
                        "firstBatch": entries,
                    },
                    "ok": 1.0,
                })
            },
            "count" => {
                let Bson::String(collection) = argument else {
                    return Err(DocTextError::server_with_code(BAD_VALUE, "collection name has invalid type"));
                };
                let query = command.get_document("query").ok().cloned().unwrap_or_default();
                let target = CollectionTarget::new(database.name.clone(), collection.clone());
                let store = self.store.read().await;
                let matched = matching(collection_ref(&store, &target), &query, None)?;

                Ok(doc! { "n": count(matched.len()), "ok": 1.0 })
            },
            "dbStats" => {
                let store = self.store.read().await;
                let (collections, objects) = store
                    .get(&database.name)
                    .map(|db| (db.len(), db.values().map(Vec::len).sum::<usize>()))
                    .unwrap_or((0, 0));

                Ok(doc! {
                    "db": database.name.clone(),
                    "collections": count(collections),
                    "objects": count(objects),
                    "ok": 1.0,
                })
            },
            "create" => {
                let Bson::String(collection) = argument else {
                    return Err(DocTextError::server_with_code(BAD_VALUE, "collection name has invalid type"));
                };
                let mut store = self.store.write().await;
                let collections = store.entry(database.name.clone()).or_default();
                if collections.contains_key(collection) {
                    return Err(DocTextError::server_with_code(
                        NAMESPACE_EXISTS,
                        format!("Collection {}.{collection} already exists.", database.name),
                    ));
                }
                collections.insert(collection.clone(), Vec::new());

                Ok(doc! { "ok": 1.0 })
            },
            "drop" => {
                let Bson::String(collection) = argument else {
                    return Err(DocTextError::server_with_code(BAD_VALUE, "collection name has invalid type"));
                };
                let mut store = self.store.write().await;
                let removed = store
                    .get_mut(&database.name)
                    .and_then(|collections| collections.remove(collection));

                match removed {
                    Some(_) => Ok(doc! { "ns": format!("{}.{collection}", database.name), "ok": 1.0 }),
                    None => Err(DocTextError::server_with_code(NAMESPACE_NOT_FOUND, "ns not found")),
                }
            },
            unknown => Err(DocTextError::server_with_code(
                COMMAND_NOT_FOUND,
                format!("no such command: '{unknown}'"),
            )),
        }
    }

    async fn drop_database(&self, database: &DatabaseTarget) -> DocTextResult<()> {
        self.store.write().await.remove(&database.name);
        Ok(())
    }

    async fn list_collections(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        _options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<Document>> {
        let store = self.store.read().await;
        catalog(&store, database, &filter)
    }

    async fn list_collection_names(
        &self,
        database: &DatabaseTarget,
        filter: Document,
        _options: ListCollectionsOptions,
    ) -> DocTextResult<Vec<String>> {
        let store = self.store.read().await;

        Ok(catalog(&store, database, &filter)?
            .into_iter()
            .filter_map(|entry| entry.get_str("name").ok().map(str::to_string))
            .collect())
    }

    async fn count_documents(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: CountOptions,
    ) -> DocTextResult<u64> {
        let store = self.store.read().await;
        let matched = matching(collection_ref(&store, collection), &filter, None)?.len() as u64;
        let remaining = matched.saturating_sub(options.skip.unwrap_or(0));

        Ok(match options.limit {
            Some(limit) if limit > 0 => remaining.min(limit),
            _ => remaining,
        })
    }

    async fn estimated_document_count(
        &self,
        collection: &CollectionTarget,
        _options: EstimatedCountOptions,
    ) -> DocTextResult<u64> {
        let store = self.store.read().await;
        Ok(collection_ref(&store, collection).len() as u64)
    }

    async fn find(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOptions,
    ) -> DocTextResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = collection_ref(&store, collection);
        let indices = matching(documents, &filter, options.sort.as_ref())?;

        // A negative limit asks for a single batch of that size.
        let limit = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        indices
            .into_iter()
            .skip(options.skip.unwrap_or(0) as usize)
            .take(limit)
            .map(|index| projected(&documents[index], options.projection.as_ref()))
            .collect()
    }

    async fn find_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneOptions,
    ) -> DocTextResult<Option<Document>> {
        Ok(self
            .find(collection, filter, options.into())
            .await?
            .into_iter()
            .next())
    }

    async fn find_one_and_delete(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        options: FindOneAndDeleteOptions,
    ) -> DocTextResult<Option<Document>> {
        if let Some(projection) = options.projection.as_ref() {
            validate_projection(projection)?;
        }

        let mut store = self.store.write().await;
        let Some(documents) = existing_mut(&mut store, collection) else {
            return Ok(None);
        };

        let Some(index) = matching(documents, &filter, options.sort.as_ref())?.first().copied() else {
            return Ok(None);
        };

        let removed = documents.remove(index);
        projected(&removed, options.projection.as_ref()).map(Some)
    }

    async fn find_one_and_replace(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        validate_replacement(&replacement)?;
        self.find_and_modify(collection, filter, Modification::Replace(replacement), options)
            .await
    }

    async fn find_one_and_update(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        validate_update(&update)?;
        self.find_and_modify(collection, filter, Modification::Update(update), options)
            .await
    }

    async fn insert_one(
        &self,
        collection: &CollectionTarget,
        document: Document,
        _options: InsertOneOptions,
    ) -> DocTextResult<InsertOneResult> {
        let mut store = self.store.write().await;
        let inserted_id = insert_document(collection_mut(&mut store, collection), collection, document)?;

        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(
        &self,
        collection: &CollectionTarget,
        documents: Vec<Document>,
        options: InsertManyOptions,
    ) -> DocTextResult<InsertManyResult> {
        if documents.is_empty() {
            return Err(DocTextError::server_with_code(BAD_VALUE, "insert_many requires at least one document"));
        }

        let ordered = options.ordered.unwrap_or(true);
        let mut store = self.store.write().await;
        let stored = collection_mut(&mut store, collection);
        let mut result = InsertManyResult::default();
        let mut first_error = None;

        for document in documents {
            match insert_document(stored, collection, document) {
                Ok(id) => result.inserted_ids.push(id),
                Err(e) if ordered => return Err(e),
                Err(e) => {
                    first_error.get_or_insert(e);
                },
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    async fn update_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        self.update(collection, filter, update, options, false).await
    }

    async fn update_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        self.update(collection, filter, update, options, true).await
    }

    async fn replace_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        validate_replacement(&replacement)?;

        let mut store = self.store.write().await;
        let mut result = UpdateResult::default();

        if let Some(documents) = existing_mut(&mut store, collection) {
            if let Some(index) = matching(documents, &filter, None)?.first().copied() {
                let replaced = replace_document(&documents[index], &replacement)?;

                result.matched_count = 1;
                if replaced != documents[index] {
                    documents[index] = replaced;
                    result.modified_count = 1;
                }
                return Ok(result);
            }
        }

        if options.upsert.unwrap_or(false) {
            let inserted = upsert_replacement(&filter, &replacement)?;
            let id = insert_document(collection_mut(&mut store, collection), collection, inserted)?;
            result.upserted_id = Some(id);
        }

        Ok(result)
    }

    async fn delete_one(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        _options: DeleteOptions,
    ) -> DocTextResult<DeleteResult> {
        self.delete(collection, filter, false).await
    }

    async fn delete_many(
        &self,
        collection: &CollectionTarget,
        filter: Document,
        _options: DeleteOptions,
    ) -> DocTextResult<DeleteResult> {
        self.delete(collection, filter, true).await
    }

    async fn distinct(
        &self,
        collection: &CollectionTarget,
        field: &str,
        filter: Document,
        _options: DistinctOptions,
    ) -> DocTextResult<Vec<Bson>> {
        let store = self.store.read().await;
        let documents = collection_ref(&store, collection);
        let mut values: Vec<Bson> = Vec::new();

        for index in matching(documents, &filter, None)? {
            for found in evaluator::resolve(&documents[index], field) {
                let candidates = match found {
                    Bson::Array(items) => items.iter().collect::<Vec<_>>(),
                    single => vec![single],
                };
                for candidate in candidates {
                    if !values.iter().any(|seen| values_equal(seen, candidate)) {
                        values.push(candidate.clone());
                    }
                }
            }
        }

        Ok(values)
    }

    async fn drop_collection(&self, collection: &CollectionTarget) -> DocTextResult<()> {
        let mut store = self.store.write().await;
        if let Some(collections) = store.get_mut(&collection.database.name) {
            collections.remove(&collection.name);
        }
        Ok(())
    }
}

/// Builder for constructing [`InMemoryBackend`] instances.
///
/// # Example
///
/// ```ignore
/// use doctext::{backend::BackendBuilder, memory::InMemoryBackend};
///
/// let backend = InMemoryBackend::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryBackendBuilder;

#[async_trait]
impl BackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    /// Always succeeds with a fresh, empty backend.
    async fn build(self) -> DocTextResult<Self::Backend> {
        Ok(InMemoryBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> CollectionTarget {
        CollectionTarget::new("test", "people")
    }

    async fn seeded() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                &people(),
                vec![
                    doc! { "_id": 1, "name": "Ann", "age": 30 },
                    doc! { "_id": 2, "name": "Bob", "age": 25 },
                    doc! { "_id": 3, "name": "Cid", "age": 41 },
                ],
                InsertManyOptions::default(),
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn insert_assigns_leading_object_id() {
        let backend = InMemoryBackend::new();
        let result = backend
            .insert_one(&people(), doc! { "name": "Ann" }, InsertOneOptions::default())
            .await
            .unwrap();

        assert!(matches!(result.inserted_id, Bson::ObjectId(_)));

        let stored = backend
            .find_one(&people(), doc! {}, FindOneOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(stored.get("_id"), Some(&result.inserted_id));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let backend = seeded().await;
        let err = backend
            .insert_one(&people(), doc! { "_id": 1 }, InsertOneOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(DUPLICATE_KEY));
    }

    #[tokio::test]
    async fn unordered_insert_many_keeps_going() {
        let backend = seeded().await;
        let options = InsertManyOptions { ordered: Some(false), ..Default::default() };
        let err = backend
            .insert_many(&people(), vec![doc! { "_id": 1 }, doc! { "_id": 4 }], options)
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(DUPLICATE_KEY));
        assert_eq!(
            backend.estimated_document_count(&people(), Default::default()).await.unwrap(),
            4,
        );
    }

    #[tokio::test]
    async fn find_sorts_skips_and_limits() {
        let backend = seeded().await;
        let options = FindOptions {
            sort: Some(doc! { "age": -1 }),
            skip: Some(1),
            limit: Some(1),
            projection: Some(doc! { "name": 1, "_id": 0 }),
            ..Default::default()
        };

        let found = backend.find(&people(), doc! {}, options).await.unwrap();
        assert_eq!(found, vec![doc! { "name": "Ann" }]);
    }

    #[tokio::test]
    async fn invalid_sort_direction_is_a_server_error() {
        let backend = seeded().await;
        let options = FindOptions { sort: Some(doc! { "age": "up" }), ..Default::default() };

        let err = backend.find(&people(), doc! {}, options).await.unwrap_err();
        assert_eq!(err.code(), Some(BAD_VALUE));
    }

    #[tokio::test]
    async fn count_honours_skip_and_limit() {
        let backend = seeded().await;
        let options = CountOptions { skip: Some(1), limit: Some(5), ..Default::default() };

        assert_eq!(backend.count_documents(&people(), doc! {}, options).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let backend = seeded().await;

        let result = backend
            .update_many(&people(), doc! { "age": { "$gte": 30 } }, doc! { "$set": { "senior": true } }, Default::default())
            .await
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (2, 2));

        let result = backend
            .update_many(&people(), doc! { "age": { "$gte": 30 } }, doc! { "$set": { "senior": true } }, Default::default())
            .await
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (2, 0));
    }

    #[tokio::test]
    async fn upsert_inserts_seeded_document() {
        let backend = InMemoryBackend::new();
        let options = UpdateOptions { upsert: Some(true), ..Default::default() };

        let result = backend
            .update_one(&people(), doc! { "name": "Dee" }, doc! { "$inc": { "visits": 1 } }, options)
            .await
            .unwrap();
        assert_eq!(result.matched_count, 0);
        assert!(result.upserted_id.is_some());

        let stored = backend
            .find_one(&people(), doc! { "name": "Dee" }, FindOneOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("visits"), Some(&Bson::Int32(1)));
    }

    #[tokio::test]
    async fn find_one_and_update_returns_requested_version() {
        let backend = seeded().await;

        let before = backend
            .find_one_and_update(&people(), doc! { "_id": 2 }, doc! { "$inc": { "age": 1 } }, Default::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.get("age"), Some(&Bson::Int32(25)));

        let options = FindOneAndModifyOptions { return_document: ReturnDocument::After, ..Default::default() };
        let after = backend
            .find_one_and_update(&people(), doc! { "_id": 2 }, doc! { "$inc": { "age": 1 } }, options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.get("age"), Some(&Bson::Int32(27)));
    }

    #[tokio::test]
    async fn mixed_projections_fail_before_any_change() {
        let backend = seeded().await;
        let projection = Some(doc! { "name": 1, "age": 0 });

        let err = backend
            .find(&people(), doc! {}, FindOptions { projection: projection.clone(), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(31254));

        let options = FindOneAndModifyOptions { projection: projection.clone(), ..Default::default() };
        let err = backend
            .find_one_and_update(&people(), doc! { "_id": 2 }, doc! { "$inc": { "age": 1 } }, options)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(31254));

        let options = FindOneAndDeleteOptions { projection, ..Default::default() };
        let err = backend.find_one_and_delete(&people(), doc! { "_id": 2 }, options).await.unwrap_err();
        assert_eq!(err.code(), Some(31254));

        let bob = backend
            .find_one(&people(), doc! { "_id": 2 }, Default::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bob.get("age"), Some(&Bson::Int32(25)));
    }

    #[tokio::test]
    async fn find_one_and_delete_respects_sort() {
        let backend = seeded().await;
        let options = FindOneAndDeleteOptions { sort: Some(doc! { "age": 1 }), ..Default::default() };

        let removed = backend
            .find_one_and_delete(&people(), doc! {}, options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(removed.get_str("name").unwrap(), "Bob");
        assert_eq!(backend.estimated_document_count(&people(), Default::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_keeps_identifier() {
        let backend = seeded().await;
        let result = backend
            .replace_one(&people(), doc! { "name": "Ann" }, doc! { "name": "Ann", "age": 31 }, Default::default())
            .await
            .unwrap();
        assert_eq!(result.modified_count, 1);

        let stored = backend
            .find_one(&people(), doc! { "_id": 1 }, FindOneOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, doc! { "_id": 1, "name": "Ann", "age": 31 });
    }

    #[tokio::test]
    async fn distinct_flattens_arrays() {
        let backend = InMemoryBackend::new();
        backend
            .insert_many(
                &people(),
                vec![doc! { "tags": ["a", "b"] }, doc! { "tags": "b" }, doc! { "tags": ["c"] }],
                Default::default(),
            )
            .await
            .unwrap();

        let values = backend.distinct(&people(), "tags", doc! {}, Default::default()).await.unwrap();
        assert_eq!(values, vec![Bson::from("a"), Bson::from("b"), Bson::from("c")]);
    }

    #[tokio::test]
    async fn catalog_lists_and_filters_collections() {
        let backend = seeded().await;
        backend
            .insert_one(&CollectionTarget::new("test", "audit"), doc! {}, Default::default())
            .await
            .unwrap();
        let database = DatabaseTarget::new("test");

        let names = backend
            .list_collection_names(&database, doc! {}, Default::default())
            .await
            .unwrap();
        assert_eq!(names, vec!["audit", "people"]);

        let entries = backend
            .list_collections(&database, doc! { "name": "people" }, Default::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get_str("type").unwrap(), "collection");
    }

    #[tokio::test]
    async fn commands_reply_like_a_server() {
        let backend = seeded().await;
        let database = DatabaseTarget::new("test");

        let reply = backend.run_command(&database, doc! { "ping": 1 }, Default::default()).await.unwrap();
        assert_eq!(reply.get("ok"), Some(&Bson::Double(1.0)));

        let reply = backend
            .run_command(&database, doc! { "count": "people", "query": { "age": { "$lt": 35 } } }, Default::default())
            .await
            .unwrap();
        assert_eq!(reply.get("n"), Some(&Bson::Int64(2)));

        let err = backend
            .run_command(&database, doc! { "shutdown": 1 }, Default::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(COMMAND_NOT_FOUND));
    }

    #[tokio::test]
    async fn drops_remove_data() {
        let backend = seeded().await;

        backend.drop_collection(&people()).await.unwrap();
        assert_eq!(backend.estimated_document_count(&people(), Default::default()).await.unwrap(), 0);

        seeded_into(&backend).await;
        backend.drop_database(&DatabaseTarget::new("test")).await.unwrap();
        let names = backend
            .list_collection_names(&DatabaseTarget::new("test"), doc! {}, Default::default())
            .await
            .unwrap();
        assert!(names.is_empty());
    }

    async fn seeded_into(backend: &InMemoryBackend) {
        backend
            .insert_one(&people(), doc! { "name": "Eve" }, Default::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn clones_share_state() {
        let backend = InMemoryBackend::builder().build().await.unwrap();
        let clone = backend.clone();

        clone.insert_one(&people(), doc! { "name": "Ann" }, Default::default()).await.unwrap();
        assert_eq!(backend.estimated_document_count(&people(), Default::default()).await.unwrap(), 1);
    }
}
