//! Convenient re-exports of commonly used types from doctext.
//!
//! ```ignore
//! use doctext::prelude::*;
//! ```
//!
//! This provides access to:
//! - The client and its database and collection handles
//! - Backend traits and builders
//! - Operation options and result records
//! - Error types

pub use doctext_core::{
    client::DocumentClient,
    database::Database,
    collection::Collection,
    backend::{DocumentBackend, BackendBuilder, DatabaseTarget, CollectionTarget},
    options::{
        DatabaseOptions, CollectionOptions, RunCommandOptions, ListCollectionsOptions,
        CountOptions, EstimatedCountOptions, FindOptions, FindOneOptions,
        FindOneAndDeleteOptions, FindOneAndModifyOptions, ReturnDocument, InsertOneOptions,
        InsertManyOptions, UpdateOptions, DeleteOptions, DistinctOptions,
        ReadConcernLevel, ReadPreferenceMode, WriteAcknowledgment,
    },
    results::{InsertOneResult, InsertManyResult, UpdateResult, DeleteResult},
    error::{DocTextError, DocTextResult},
};
