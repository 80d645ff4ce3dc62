//! Outcome records returned by write operations.
//!
//! The records serialize with `serde`, so callers working purely in text can
//! render them with `serde_json` alongside the documents they came with.

use bson::Bson;
use serde::Serialize;

/// The outcome of inserting a single document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOneResult {
    /// Identifier of the inserted document, generated by the store if the
    /// document had no `_id`.
    pub inserted_id: Bson,
}

/// The outcome of inserting a sequence of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsertManyResult {
    /// Identifiers of the inserted documents, in input order.
    pub inserted_ids: Vec<Bson>,
}

/// The outcome of an update or replace operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateResult {
    /// Number of documents that matched the filter.
    pub matched_count: u64,
    /// Number of documents that were actually changed.
    pub modified_count: u64,
    /// Identifier of the inserted document when an upsert created one.
    pub upserted_id: Option<Bson>,
}

/// The outcome of a delete operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteResult {
    /// Number of documents removed.
    pub deleted_count: u64,
}
