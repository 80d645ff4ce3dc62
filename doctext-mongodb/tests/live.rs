//! Integration tests against a running MongoDB server.
//!
//! These tests require a reachable server. Set DOCTEXT_MONGODB_URI (defaults
//! to mongodb://localhost:27017).
//!
//! Run tests with: cargo test --package doctext-mongodb --test live -- --ignored

use bson::{Bson, doc};
use doctext_core::{
    backend::{BackendBuilder, CollectionTarget, DatabaseTarget, DocumentBackend},
    client::DocumentClient,
    error::DocTextError,
    options::{FindOneAndModifyOptions, ReturnDocument},
};
use doctext_mongodb::{MongoDbBackend, MongoDbConfig};

/// Helper to connect to the test server with a fresh database name.
async fn connect() -> (DocumentClient<MongoDbBackend>, String) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = MongoDbConfig::from_env().expect("valid environment");
    let backend = MongoDbBackend::from_config(config)
        .build()
        .await
        .expect("Failed to connect to MongoDB");
    let database = format!("doctext_test_{}", bson::oid::ObjectId::new().to_hex());

    (DocumentClient::new(backend), database)
}

/// Helper to remove the test database.
async fn cleanup(client: &DocumentClient<MongoDbBackend>, database: &str) {
    client
        .use_database(database, None)
        .drop()
        .await
        .expect("Failed to drop test database");
}

fn number(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

#[tokio::test]
async fn unreachable_server_fails_initialization() {
    let result = MongoDbBackend::builder("mongodb://127.0.0.1:1/?directConnection=true")
        .connect_timeout_secs(1)
        .build()
        .await;

    assert!(matches!(result, Err(DocTextError::Initialization(_))));
}

#[tokio::test]
async fn malformed_uri_fails_initialization() {
    let result = MongoDbBackend::builder("not a connection string").build().await;

    assert!(matches!(result, Err(DocTextError::Initialization(_))));
}

#[tokio::test]
#[ignore]
async fn ann_round_trip() {
    let (client, database) = connect().await;
    let people = client.use_database(&database, None).collection("people", None);

    people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await.unwrap();
    let ann = people.find_one(r#"{"name": "Ann"}"#, None).await.unwrap();
    assert_eq!(number(ann.get("age")), Some(30.0));

    let result = people
        .update_one(r#"{"name": "Ann"}"#, r#"{"$set": {"age": 31}}"#, None)
        .await
        .unwrap();
    assert_eq!((result.matched_count, result.modified_count), (1, 1));

    let ann = people.find_one(r#"{"name": "Ann"}"#, None).await.unwrap();
    assert_eq!(number(ann.get("age")), Some(31.0));

    cleanup(&client, &database).await;
}

#[tokio::test]
#[ignore]
async fn no_match_and_duplicate_key() {
    let (client, database) = connect().await;
    let people = client.use_database(&database, None).collection("people", None);

    let err = people.find_one(r#"{"name": "Zed"}"#, None).await.unwrap_err();
    assert!(err.is_no_match());

    people.insert_one(r#"{"_id": 1}"#, None).await.unwrap();
    let err = people.insert_one(r#"{"_id": 1}"#, None).await.unwrap_err();
    assert_eq!(err.code(), Some(11000));

    cleanup(&client, &database).await;
}

#[tokio::test]
#[ignore]
async fn insert_many_reports_the_duplicate_key_code() {
    let (client, database) = connect().await;
    let people = client.use_database(&database, None).collection("people", None);

    let err = people.insert_many(r#"[{"_id": 1}, {"_id": 1}]"#, None).await.unwrap_err();
    assert_eq!(err.code(), Some(11000));
    assert!(err.to_string().contains("inserted ids: [1]"));

    assert_eq!(people.count_documents("{}", None).await.unwrap(), 1);

    cleanup(&client, &database).await;
}

#[tokio::test]
#[ignore]
async fn find_and_modify_returns_the_original() {
    let (client, database) = connect().await;
    let people = client.use_database(&database, None).collection("people", None);
    people
        .insert_many(r#"[{"name": "Ann", "age": 30}, {"name": "Bob", "age": 25}]"#, None)
        .await
        .unwrap();

    let before = people
        .find_one_and_update(r#"{"name": "Bob"}"#, r#"{"$inc": {"age": 1}}"#, None)
        .await
        .unwrap();
    assert_eq!(number(before.get("age")), Some(25.0));

    let options = FindOneAndModifyOptions { return_document: ReturnDocument::After, ..Default::default() };
    let after = people
        .find_one_and_replace(r#"{"name": "Ann"}"#, r#"{"name": "Ann", "age": 40}"#, options)
        .await
        .unwrap();
    assert_eq!(number(after.get("age")), Some(40.0));

    let removed = people.find_one_and_delete(r#"{"name": "Ann"}"#, None).await.unwrap();
    assert_eq!(removed.get_str("name").unwrap(), "Ann");

    cleanup(&client, &database).await;
}

#[tokio::test]
#[ignore]
async fn delete_many_then_count() {
    let (client, database) = connect().await;
    let people = client.use_database(&database, None).collection("people", None);
    people
        .insert_many(r#"[{"city": "Oslo"}, {"city": "Oslo"}, {"city": "Bergen"}]"#, None)
        .await
        .unwrap();

    let result = people.delete_many(r#"{"city": "Oslo"}"#, None).await.unwrap();
    assert_eq!(result.deleted_count, 2);
    assert_eq!(people.count_documents(r#"{"city": "Oslo"}"#, None).await.unwrap(), 0);

    let cities = people.distinct("city", "{}", None).await.unwrap();
    assert_eq!(cities, vec![Bson::from("Bergen")]);

    cleanup(&client, &database).await;
}

#[tokio::test]
#[ignore]
async fn commands_and_catalog() {
    let (client, database) = connect().await;
    let handle = client.use_database(&database, None);

    let reply = handle.run_command(r#"{"ping": 1}"#, None).await.unwrap();
    assert_eq!(number(reply.get("ok")), Some(1.0));

    handle.collection("events", None).insert_one("{}", None).await.unwrap();
    let names = handle.list_collection_names("{}", None).await.unwrap();
    assert_eq!(names, vec!["events"]);

    let backend = client.backend();
    let target = CollectionTarget::new(database.clone(), "events");
    assert_eq!(
        backend.estimated_document_count(&target, Default::default()).await.unwrap(),
        1,
    );

    backend.drop_database(&DatabaseTarget::new(database.clone())).await.unwrap();
    let reply = backend
        .run_command(&DatabaseTarget::new(database), doc! { "listCollections": 1 }, Default::default())
        .await
        .unwrap();
    assert_eq!(number(reply.get("ok")), Some(1.0));
}
