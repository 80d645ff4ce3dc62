//! Core of the doctext facade: document handles whose arguments are JSON text.
//!
//! This crate provides:
//!
//! - **Client** ([`client`]) - The owned connection object handles are created from
//! - **Database handles** ([`database`]) - Commands, catalog listing and collection handles
//! - **Collection handles** ([`collection`]) - Counting, finding, inserting, updating and deleting
//! - **Text decoding** ([`decode`]) - JSON text to BSON documents and back
//! - **Backend abstraction** ([`backend`]) - The capability set a document store must provide
//! - **Options and results** ([`options`], [`results`]) - Pass-through configuration and outcome records
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use doctext::{prelude::*, memory::InMemoryBackend};
//!
//! let client = DocumentClient::new(InMemoryBackend::new());
//! let people = client.use_database("test", None).collection("people", None);
//!
//! people.insert_one(r#"{"name": "Ann", "age": 30}"#, None).await?;
//! let ann = people.find_one(r#"{"name": "Ann"}"#, None).await?;
//! ```

pub mod backend;
pub mod client;
pub mod collection;
pub mod database;
pub mod decode;
pub mod error;
pub mod options;
pub mod results;
