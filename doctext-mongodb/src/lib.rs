//! MongoDB backend implementation for doctext.
//!
//! This crate implements the `DocumentBackend` trait on top of the official
//! MongoDB async driver. Every decoded operation is handed to the driver
//! unchanged; pooling, server selection and the wire protocol stay with the
//! driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! doctext = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Building the backend connects and pings the primary, bounded by a bootstrap
//! timeout (10 seconds unless configured otherwise). A failure is returned to
//! the caller instead of aborting the process.
//!
//! # Example
//!
//! ```ignore
//! use doctext::{prelude::*, mongodb::{MongoDbBackend, MongoDbConfig}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbBackend::from_config(MongoDbConfig::from_env()?)
//!         .build()
//!         .await?;
//!     let client = DocumentClient::new(backend);
//!
//!     let names = client
//!         .use_database("test", None)
//!         .list_collection_names("{}", None)
//!         .await?;
//!
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod store;
pub(crate) mod options;

pub use config::MongoDbConfig;
pub use store::{MongoDbBackend, MongoDbBackendBuilder};
