//! Arguments are checked before anything reaches a backend.
//!
//! Every test here runs against a backend that panics when called, so a
//! passing test proves the failure was detected inside the facade.

mod common;

use common::UnreachableBackend;
use doctext::{
    bson::Bson,
    memory::InMemoryBackend,
    prelude::*,
};

const BROKEN: &str = r#"{"name": "Ann""#;
const FILTER: &str = r#"{"name": "Ann"}"#;
const UPDATE: &str = r#"{"$set": {"age": 31}}"#;

fn is_decode<T>(result: DocTextResult<T>) -> bool {
    matches!(result, Err(DocTextError::Decode(_)))
}

fn is_nil<T>(result: DocTextResult<T>) -> bool {
    matches!(result, Err(DocTextError::NilCollection))
}

#[tokio::test]
async fn malformed_text_fails_every_collection_operation() {
    common::init_tracing();
    let client = DocumentClient::new(UnreachableBackend);
    let people = client.use_database("test", None).collection("people", None);

    assert!(is_decode(people.count_documents(BROKEN, None).await));
    assert!(is_decode(people.find(BROKEN, None).await));
    assert!(is_decode(people.find_one(BROKEN, None).await));
    assert!(is_decode(people.find_one_and_delete(BROKEN, None).await));
    assert!(is_decode(people.find_one_and_replace(BROKEN, FILTER, None).await));
    assert!(is_decode(people.find_one_and_replace(FILTER, BROKEN, None).await));
    assert!(is_decode(people.find_one_and_update(BROKEN, UPDATE, None).await));
    assert!(is_decode(people.find_one_and_update(FILTER, BROKEN, None).await));
    assert!(is_decode(people.insert_one(BROKEN, None).await));
    assert!(is_decode(people.insert_many(BROKEN, None).await));
    assert!(is_decode(people.update_one(BROKEN, UPDATE, None).await));
    assert!(is_decode(people.update_one(FILTER, BROKEN, None).await));
    assert!(is_decode(people.update_many(BROKEN, UPDATE, None).await));
    assert!(is_decode(people.update_many(FILTER, BROKEN, None).await));
    assert!(is_decode(people.update_by_id("ann", BROKEN, None).await));
    assert!(is_decode(people.replace_one(BROKEN, FILTER, None).await));
    assert!(is_decode(people.replace_one(FILTER, BROKEN, None).await));
    assert!(is_decode(people.delete_one(BROKEN, None).await));
    assert!(is_decode(people.delete_many(BROKEN, None).await));
    assert!(is_decode(people.distinct("name", BROKEN, None).await));
}

#[tokio::test]
async fn malformed_text_fails_every_database_operation() {
    let client = DocumentClient::new(UnreachableBackend);
    let database = client.use_database("test", None);

    assert!(is_decode(database.run_command(BROKEN, None).await));
    assert!(is_decode(database.list_collections(BROKEN, None).await));
    assert!(is_decode(database.list_collection_names(BROKEN, None).await));
}

#[tokio::test]
async fn documents_must_be_objects() {
    let client = DocumentClient::new(UnreachableBackend);
    let people = client.use_database("test", None).collection("people", None);

    assert!(is_decode(people.find("[1, 2]", None).await));
    assert!(is_decode(people.insert_one(r#""Ann""#, None).await));
    assert!(is_decode(people.insert_many(FILTER, None).await));
    assert!(is_decode(people.insert_many(r#"[{"name": "Ann"}, 3]"#, None).await));
    assert!(is_decode(people.count_documents("", None).await));
}

#[tokio::test]
async fn update_by_id_rejects_missing_identifiers() {
    let client = DocumentClient::new(UnreachableBackend);
    let people = client.use_database("test", None).collection("people", None);

    let err = people.update_by_id(Bson::Null, UPDATE, None).await.unwrap_err();
    assert_eq!(err, DocTextError::NilIdentifier);

    // The identifier is checked before the update text is decoded.
    let err = people.update_by_id(Bson::Undefined, BROKEN, None).await.unwrap_err();
    assert_eq!(err, DocTextError::NilIdentifier);
}

#[tokio::test]
async fn unbound_handles_fail_before_decoding() {
    let people = Collection::<InMemoryBackend>::default();
    assert!(!people.is_bound());

    assert!(is_nil(people.find_one(BROKEN, None).await));
    assert!(is_nil(people.find_one(FILTER, None).await));
    assert!(is_nil(people.count_documents(BROKEN, None).await));
    assert!(is_nil(people.estimated_document_count(None).await));
    assert!(is_nil(people.find(BROKEN, None).await));
    assert!(is_nil(people.find_one_and_delete(BROKEN, None).await));
    assert!(is_nil(people.find_one_and_replace(BROKEN, BROKEN, None).await));
    assert!(is_nil(people.find_one_and_update(FILTER, BROKEN, None).await));
    assert!(is_nil(people.insert_one(BROKEN, None).await));
    assert!(is_nil(people.insert_many(BROKEN, None).await));
    assert!(is_nil(people.update_one(FILTER, BROKEN, None).await));
    assert!(is_nil(people.update_many(BROKEN, UPDATE, None).await));
    assert!(is_nil(people.update_by_id(Bson::Null, UPDATE, None).await));
    assert!(is_nil(people.replace_one(FILTER, BROKEN, None).await));
    assert!(is_nil(people.delete_one(BROKEN, None).await));
    assert!(is_nil(people.delete_many(BROKEN, None).await));
    assert!(is_nil(people.distinct("name", FILTER, None).await));
    assert!(is_nil(people.drop().await));
}
