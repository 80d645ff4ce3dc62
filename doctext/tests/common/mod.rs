//! Shared fixtures for the facade integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use doctext::{
    bson::{Bson, Document},
    memory::InMemoryBackend,
    prelude::*,
};

pub const DATABASE: &str = "fixtures";
pub const PEOPLE: &str = "people";

/// Installs a test log writer once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The people fixture, inserted in this order.
pub const PEOPLE_FIXTURE: &str = r#"[
    {"name": "Ann", "age": 30, "city": "Oslo", "tags": ["admin", "ops"]},
    {"name": "Bob", "age": 25, "city": "Bergen", "tags": ["dev"]},
    {"name": "Cid", "age": 41, "city": "Oslo", "tags": []},
    {"name": "Dee", "age": 35, "city": "Trondheim", "tags": ["dev", "ops"]},
    {"name": "Eve", "age": 19, "city": "Bergen"}
]"#;

/// A client over an empty in-memory backend.
pub fn empty_client() -> DocumentClient<InMemoryBackend> {
    init_tracing();
    DocumentClient::new(InMemoryBackend::new())
}

/// A client whose `fixtures.people` collection holds [`PEOPLE_FIXTURE`].
pub async fn fixture_client() -> DocumentClient<InMemoryBackend> {
    let client = empty_client();
    client
        .use_database(DATABASE, None)
        .collection(PEOPLE, None)
        .insert_many(PEOPLE_FIXTURE, None)
        .await
        .expect("fixture insert");
    client
}

/// Numeric value regardless of the integer width the decoder picked.
pub fn number(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Sorted `name` fields of `documents`.
pub fn names(documents: &[Document]) -> Vec<String> {
    let mut names = documents
        .iter()
        .filter_map(|doc| doc.get_str("name").ok().map(str::to_string))
        .collect::<Vec<_>>();
    names.sort();
    names
}

/// A backend that fails the test if it is ever reached.
///
/// Used to show that argument decoding and handle checks happen before any
/// request is made.
#[derive(Debug, Default)]
pub struct UnreachableBackend;

fn reached(operation: &str) -> ! {
    panic!("{operation} reached the backend")
}

#[async_trait]
impl DocumentBackend for UnreachableBackend {
    async fn run_command(&self, _: &DatabaseTarget, _: Document, _: RunCommandOptions) -> DocTextResult<Document> {
        reached("run_command")
    }

    async fn drop_database(&self, _: &DatabaseTarget) -> DocTextResult<()> {
        reached("drop_database")
    }

    async fn list_collections(
        &self,
        _: &DatabaseTarget,
        _: Document,
        _: ListCollectionsOptions,
    ) -> DocTextResult<Vec<Document>> {
        reached("list_collections")
    }

    async fn list_collection_names(
        &self,
        _: &DatabaseTarget,
        _: Document,
        _: ListCollectionsOptions,
    ) -> DocTextResult<Vec<String>> {
        reached("list_collection_names")
    }

    async fn count_documents(&self, _: &CollectionTarget, _: Document, _: CountOptions) -> DocTextResult<u64> {
        reached("count_documents")
    }

    async fn estimated_document_count(&self, _: &CollectionTarget, _: EstimatedCountOptions) -> DocTextResult<u64> {
        reached("estimated_document_count")
    }

    async fn find(&self, _: &CollectionTarget, _: Document, _: FindOptions) -> DocTextResult<Vec<Document>> {
        reached("find")
    }

    async fn find_one(&self, _: &CollectionTarget, _: Document, _: FindOneOptions) -> DocTextResult<Option<Document>> {
        reached("find_one")
    }

    async fn find_one_and_delete(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: FindOneAndDeleteOptions,
    ) -> DocTextResult<Option<Document>> {
        reached("find_one_and_delete")
    }

    async fn find_one_and_replace(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: Document,
        _: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        reached("find_one_and_replace")
    }

    async fn find_one_and_update(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: Document,
        _: FindOneAndModifyOptions,
    ) -> DocTextResult<Option<Document>> {
        reached("find_one_and_update")
    }

    async fn insert_one(&self, _: &CollectionTarget, _: Document, _: InsertOneOptions) -> DocTextResult<InsertOneResult> {
        reached("insert_one")
    }

    async fn insert_many(
        &self,
        _: &CollectionTarget,
        _: Vec<Document>,
        _: InsertManyOptions,
    ) -> DocTextResult<InsertManyResult> {
        reached("insert_many")
    }

    async fn update_one(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: Document,
        _: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        reached("update_one")
    }

    async fn update_many(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: Document,
        _: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        reached("update_many")
    }

    async fn replace_one(
        &self,
        _: &CollectionTarget,
        _: Document,
        _: Document,
        _: UpdateOptions,
    ) -> DocTextResult<UpdateResult> {
        reached("replace_one")
    }

    async fn delete_one(&self, _: &CollectionTarget, _: Document, _: DeleteOptions) -> DocTextResult<DeleteResult> {
        reached("delete_one")
    }

    async fn delete_many(&self, _: &CollectionTarget, _: Document, _: DeleteOptions) -> DocTextResult<DeleteResult> {
        reached("delete_many")
    }

    async fn distinct(&self, _: &CollectionTarget, _: &str, _: Document, _: DistinctOptions) -> DocTextResult<Vec<Bson>> {
        reached("distinct")
    }

    async fn drop_collection(&self, _: &CollectionTarget) -> DocTextResult<()> {
        reached("drop_collection")
    }
}
