//! In-memory document backend for doctext.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DocumentBackend` trait. It evaluates filters, update operators, sorts and
//! projections itself and reports failures with MongoDB's server error codes,
//! so code written against the facade behaves the same whether it talks to a
//! server or to this backend.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Query operators** - Comparisons, `$in`, `$exists`, `$regex`, `$elemMatch`, `$and`/`$or`/`$nor` and more
//! - **Update operators** - `$set`, `$unset`, `$inc`, `$push`, `$pull`, `$addToSet` and more, with upserts
//! - **Commands** - `ping`, `buildInfo`, `count`, `dbStats`, `create`, `drop`, `listCollections`
//!
//! # Quick Start
//!
//! ```ignore
//! use doctext::{prelude::*, memory::InMemoryBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryBackend::builder().build().await?;
//!     let client = DocumentClient::new(backend);
//!     let people = client.use_database("test", None).collection("people", None);
//!
//!     people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await?;
//!     let ann = people.find_one(r#"{"name": "Ann"}"#, None).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
pub(crate) mod evaluator;
pub(crate) mod update;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};
