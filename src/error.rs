//! Error types for clustermeta
//!
//! This module defines all error types used by the catalog, the persist layer
//! and the cluster mode orchestration.

use std::time::Duration;
use thiserror::Error;

/// The main error type for clustermeta
#[derive(Error, Debug)]
pub enum Error {
    // ========== Catalog Errors ==========
    #[error("Catalog error: database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("Catalog error: schema '{schema}' not found in database '{database}'")]
    SchemaNotFound { database: String, schema: String },

    #[error("Catalog error: schema '{schema}' already exists in database '{database}'")]
    SchemaAlreadyExists { database: String, schema: String },

    // ========== Persist Errors ==========
    #[error("Persist error: {operation} '{key}' failed: {message}")]
    Repository {
        operation: &'static str,
        key: String,
        message: String,
    },

    #[error("Persist error: {operation} '{key}' exceeded timeout after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        key: String,
        elapsed: Duration,
    },

    #[error("Persist error: malformed document at '{key}': {source}")]
    MalformedDocument {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Persist error: cannot serialize document: {0}")]
    Serialize(#[from] serde_yaml::Error),

    // ========== Mode Errors ==========
    #[error(
        "Mode error: schema '{schema}' in database '{database}' was renamed to '{renamed_to}' \
         but its old node could not be removed: {source}"
    )]
    RenameIncomplete {
        database: String,
        schema: String,
        renamed_to: String,
        #[source]
        source: Box<Error>,
    },

    // ========== Config Errors ==========
    #[error("Config error: {0}")]
    InvalidConfig(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a failed repository call.
    pub fn repository(
        operation: &'static str,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Repository {
            operation,
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for clustermeta operations
pub type Result<T> = std::result::Result<T, Error>;
