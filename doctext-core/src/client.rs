//! The owned connection object handles are created from.
//!
//! A [`DocumentClient`] wraps one backend. It is constructed explicitly by the
//! host application and passed around by reference, so several clients (for
//! instance one per test) can coexist in a process.
//!
//! # Example
//!
//! ```ignore
//! use doctext::{prelude::*, mongodb::MongoDbBackend};
//!
//! let client = DocumentClient::new(MongoDbBackend::builder("mongodb://localhost:27017").build().await?);
//! let people = client.use_database("test", None).collection("people", None);
//! let adults = people.find(r#"{"age": {"$gte": 18}}"#, None).await?;
//! ```

use crate::{
    backend::{DatabaseTarget, DocumentBackend},
    database::Database,
    error::DocTextResult,
    options::DatabaseOptions,
};

/// An owned connection to a document store.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentClient<B: DocumentBackend> {
    backend: B,
}

impl<B: DocumentBackend> DocumentClient<B> {
    /// Creates a new client around an already connected backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend this client forwards to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a handle to the named database.
    ///
    /// A fresh handle is constructed on every call. This never fails; whether
    /// the name is valid is left to the server.
    pub fn use_database<'a>(
        &'a self,
        name: &str,
        options: impl Into<Option<DatabaseOptions>>,
    ) -> Database<'a, B> {
        Database::new(
            DatabaseTarget::with_options(name, options.into().unwrap_or_default()),
            &self.backend,
        )
    }

    /// Shuts down the client and releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    pub async fn shutdown(self) -> DocTextResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
