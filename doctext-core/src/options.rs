//! Optional per-handle and per-operation configuration.
//!
//! These types mirror the subset of driver options the facade forwards. A
//! backend translates them into its own representation; an options value with
//! no field set behaves exactly like passing no options at all.
//!
//! All operations accept `impl Into<Option<T>>`, so callers can pass either
//! `None` or a value directly:
//!
//! ```ignore
//! let people = db.collection("people", None);
//! let oldest = people
//!     .find("{}", FindOptions { sort: Some(doc! { "age": -1 }), limit: Some(1), ..Default::default() })
//!     .await?;
//! ```

use std::time::Duration;

use bson::Document;

/// Read concern levels understood by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadConcernLevel {
    Local,
    Majority,
    Linearizable,
    Available,
    Snapshot,
}

/// Write acknowledgment requested from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAcknowledgment {
    /// Acknowledged by the given number of nodes.
    Nodes(u32),
    /// Acknowledged by a majority of voting nodes.
    Majority,
    /// Acknowledged according to a named custom write concern.
    Custom(String),
}

/// Read preference used when routing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPreferenceMode {
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

/// Which version of a document a find-and-modify operation returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    /// The document as it was before the modification.
    #[default]
    Before,
    /// The document as it is after the modification.
    After,
}

/// Options applied to every operation issued through a database handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseOptions {
    pub read_concern: Option<ReadConcernLevel>,
    pub write_concern: Option<WriteAcknowledgment>,
}

/// Options applied to every operation issued through a collection handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOptions {
    pub read_concern: Option<ReadConcernLevel>,
    pub write_concern: Option<WriteAcknowledgment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCommandOptions {
    pub read_preference: Option<ReadPreferenceMode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCollectionsOptions {
    pub batch_size: Option<u32>,
    /// Only list collections the current user is authorized to access.
    pub authorized_collections: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub max_time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimatedCountOptions {
    pub max_time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub batch_size: Option<u32>,
    pub max_time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    pub skip: Option<u64>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub max_time: Option<Duration>,
}

impl From<FindOneOptions> for FindOptions {
    fn from(options: FindOneOptions) -> Self {
        FindOptions {
            limit: Some(1),
            skip: options.skip,
            sort: options.sort,
            projection: options.projection,
            batch_size: None,
            max_time: options.max_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndDeleteOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub max_time: Option<Duration>,
}

/// Options shared by find-one-and-replace and find-one-and-update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndModifyOptions {
    pub return_document: ReturnDocument,
    pub upsert: Option<bool>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub max_time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOneOptions {
    pub bypass_document_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyOptions {
    /// Stop at the first failed insert (the server default) when `true` or unset.
    pub ordered: Option<bool>,
    pub bypass_document_validation: Option<bool>,
}

/// Options shared by update-one, update-many, update-by-id and replace-one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    pub upsert: Option<bool>,
    pub bypass_document_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    /// Name of the index the server should use.
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctOptions {
    pub max_time: Option<Duration>,
}
