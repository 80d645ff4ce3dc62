//! A thin MongoDB facade whose filters, updates and documents are JSON text.
//!
//! This crate is the entry point for users of doctext. It re-exports the
//! handle types from `doctext-core` and gives access to the available
//! backends. Every argument that describes a document (a filter, an update,
//! a replacement, a document to insert) is passed as JSON text, decoded into
//! an order-preserving BSON document and forwarded unchanged.
//!
//! # Features
//!
//! - **JSON text arguments** - Filters and updates are written the way the MongoDB shell shows them
//! - **Early rejection** - Malformed text fails before any request is sent
//! - **Multiple backends** - MongoDB through the official driver, or an in-memory store for tests
//! - **Uniform errors** - One error type for decoding, binding and server failures
//!
//! # Quick Start
//!
//! ```ignore
//! use doctext::{prelude::*, memory::InMemoryBackend};
//!
//! #[tokio::main]
//! async fn main() -> DocTextResult<()> {
//!     let client = DocumentClient::new(InMemoryBackend::builder().build().await?);
//!     let people = client.use_database("test", None).collection("people", None);
//!
//!     people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await?;
//!
//!     let result = people
//!         .update_one(r#"{"name": "Ann"}"#, r#"{"$set": {"age": 31}}"#, None)
//!         .await?;
//!     assert_eq!(result.modified_count, 1);
//!
//!     match people.find_one(r#"{"name": "Bob"}"#, None).await {
//!         Err(e) if e.is_no_match() => println!("no Bob"),
//!         other => println!("{other:?}"),
//!     }
//!
//!     client.shutdown().await
//! }
//! ```
//!
//! # Connecting to MongoDB
//!
//! With the `mongodb` feature enabled, the backend is built from a
//! [`MongoDbConfig`](mongodb::MongoDbConfig). Building connects, pings the
//! primary and fails with [`DocTextError::Initialization`](error::DocTextError::Initialization)
//! if the server cannot be reached within the bootstrap timeout.
//!
//! ```ignore
//! use doctext::{prelude::*, mongodb::{MongoDbBackend, MongoDbConfig}};
//!
//! let backend = MongoDbBackend::from_config(MongoDbConfig::from_env()?)
//!     .build()
//!     .await?;
//! let client = DocumentClient::new(backend);
//! ```
//!
//! # Cancellation
//!
//! Operations are futures; dropping one abandons the request. Wrap a call in
//! `tokio::time::timeout` for a caller-side deadline, or set `max_time` in the
//! operation's options for a server-side one.
//!
//! # Backends
//!
//! - [`memory`] - In-memory store for development and testing
//! - [`mongodb`] - MongoDB through the official driver (requires the `mongodb` feature)

pub mod prelude;

pub use bson;

pub use doctext_core::{
    backend,
    client,
    collection,
    database,
    decode,
    error,
    options,
    results,
};

/// In-memory backend.
pub mod memory {
    pub use doctext_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// MongoDB backend.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use doctext_mongodb::{MongoDbBackend, MongoDbBackendBuilder, MongoDbConfig};
}
