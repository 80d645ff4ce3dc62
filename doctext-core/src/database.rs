//! Database handles.
//!
//! A [`Database`] names one database on the client's backend. It creates
//! collection handles and runs administrative operations whose arguments are
//! given as JSON text.

use crate::{
    backend::{CollectionTarget, DatabaseTarget, DocumentBackend},
    collection::Collection,
    decode::decode_document,
    error::DocTextResult,
    options::{CollectionOptions, DatabaseOptions, ListCollectionsOptions, RunCommandOptions},
};
use bson::Document;

/// A handle to a named database.
///
/// Handles are cheap, immutable and never cached; every call to
/// [`DocumentClient::use_database`](crate::client::DocumentClient::use_database)
/// builds a new one.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The backend type
#[derive(Debug)]
pub struct Database<'a, B: DocumentBackend> {
    target: DatabaseTarget,
    backend: &'a B,
}

impl<'a, B: DocumentBackend> Database<'a, B> {
    pub(crate) fn new(target: DatabaseTarget, backend: &'a B) -> Self {
        Self { target, backend }
    }

    /// Returns the name of this database.
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Returns the options this handle was opened with.
    pub fn options(&self) -> &DatabaseOptions {
        &self.target.options
    }

    /// Gets a handle to a collection in this database.
    pub fn collection(
        &self,
        name: &str,
        options: impl Into<Option<CollectionOptions>>,
    ) -> Collection<'a, B> {
        Collection::new(
            CollectionTarget {
                database: self.target.clone(),
                name: name.to_string(),
                options: options.into().unwrap_or_default(),
            },
            self.backend,
        )
    }

    /// Runs an administrative command given as JSON text.
    ///
    /// The command document keeps the key order of `command`; the first key
    /// names the command, for example `{"count": "people", "query": {}}`.
    ///
    /// # Errors
    ///
    /// Returns [`DocTextError::Decode`](crate::error::DocTextError::Decode) if
    /// `command` is not a JSON object, or a server error if the command is
    /// rejected.
    pub async fn run_command(
        &self,
        command: &str,
        options: impl Into<Option<RunCommandOptions>>,
    ) -> DocTextResult<Document> {
        let command = decode_document(command)?;

        tracing::debug!(database = %self.target.name, "run_command");

        self.backend
            .run_command(&self.target, command, options.into().unwrap_or_default())
            .await
    }

    /// Drops the entire database.
    ///
    /// # Warning
    ///
    /// There is no confirmation step and the operation cannot be undone.
    pub async fn drop(&self) -> DocTextResult<()> {
        tracing::debug!(database = %self.target.name, "drop_database");

        self.backend.drop_database(&self.target).await
    }

    /// Lists the catalog entries of the collections matching `filter`.
    ///
    /// The whole result is collected before returning.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `filter` is not a JSON object.
    pub async fn list_collections(
        &self,
        filter: &str,
        options: impl Into<Option<ListCollectionsOptions>>,
    ) -> DocTextResult<Vec<Document>> {
        let filter = decode_document(filter)?;

        tracing::debug!(database = %self.target.name, "list_collections");

        self.backend
            .list_collections(&self.target, filter, options.into().unwrap_or_default())
            .await
    }

    /// Lists the names of the collections matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `filter` is not a JSON object.
    pub async fn list_collection_names(
        &self,
        filter: &str,
        options: impl Into<Option<ListCollectionsOptions>>,
    ) -> DocTextResult<Vec<String>> {
        let filter = decode_document(filter)?;

        tracing::debug!(database = %self.target.name, "list_collection_names");

        self.backend
            .list_collection_names(&self.target, filter, options.into().unwrap_or_default())
            .await
    }
}
