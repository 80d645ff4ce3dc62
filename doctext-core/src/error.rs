//! Error types and result types for facade operations.
//!
//! Every operation returns a [`DocTextResult<T>`]. Errors are handed back to the
//! caller exactly as they were produced; the facade never retries or recovers.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when using the facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocTextError {
    /// A textual argument was not valid serialized-document syntax.
    ///
    /// Always raised before the backend is contacted.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The collection handle was never bound to a database.
    #[error("Collection is not bound to a database")]
    NilCollection,
    /// A required identifier was null or absent.
    #[error("Identifier must not be null")]
    NilIdentifier,
    /// A single-document operation matched no documents in the collection.
    #[error("No document matched the filter in collection {collection}")]
    NoMatch {
        /// Name of the collection that was searched.
        collection: String,
    },
    /// The store rejected the operation.
    ///
    /// `code` carries the server's numeric error code when one was reported
    /// (for instance `11000` for a duplicate key).
    #[error("Server error{}: {message}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Server {
        /// Server error code, if the driver exposed one.
        code: Option<i32>,
        /// Human readable description.
        message: String,
    },
    /// The connection could not be established or verified at startup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A value could not be converted to or from BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocTextError {
    /// Builds a [`DocTextError::Server`] without an error code.
    pub fn server(message: impl Into<String>) -> Self {
        DocTextError::Server { code: None, message: message.into() }
    }

    /// Builds a [`DocTextError::Server`] carrying a server error code.
    pub fn server_with_code(code: i32, message: impl Into<String>) -> Self {
        DocTextError::Server { code: Some(code), message: message.into() }
    }

    /// Returns the server error code, if this is a server error that carries one.
    pub fn code(&self) -> Option<i32> {
        match self {
            DocTextError::Server { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether this error reports that no document matched.
    pub fn is_no_match(&self) -> bool {
        matches!(self, DocTextError::NoMatch { .. })
    }
}

/// A specialized `Result` type for facade operations.
pub type DocTextResult<T> = Result<T, DocTextError>;

impl From<SerdeJsonError> for DocTextError {
    fn from(err: SerdeJsonError) -> Self {
        DocTextError::Decode(err.to_string())
    }
}
