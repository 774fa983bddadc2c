//! Error types for the returns desk.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all returns desk operations.
#[derive(Error, Debug)]
pub enum ReturnsError {
    /// The backing store file could not be opened
    #[error("Store unavailable at '{path}': {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// Statement-level failures against the store (DDL, insert, select)
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// The CSV source is missing or unreadable
    #[error("Source not found: '{path}'")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The CSV reader rejected the content
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: csv::Error,
    },
    /// Structurally unusable tabular content
    #[error("Parse error: {message}")]
    MalformedSource { message: String },
    /// Extraction produced nothing to insert
    #[error("Nothing could be extracted from the input")]
    EmptyRecord,
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Coarse classification used when reporting failures to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad path, empty extraction, missing data. Resubmit with better input.
    Input,
    /// Malformed tabular content.
    Parse,
    /// The store refused or could not be reached.
    Store,
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> ReturnsError {
        ReturnsError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> ReturnsError {
        ReturnsError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl ReturnsError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceNotFound { .. } | Self::EmptyRecord | Self::InvalidInput { .. } => {
                ErrorCategory::Input
            }
            Self::Parse { .. } | Self::MalformedSource { .. } => ErrorCategory::Parse,
            Self::StoreUnavailable { .. }
            | Self::Database { .. }
            | Self::FileSystem { .. }
            | Self::Serialization { .. } => ErrorCategory::Store,
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| ReturnsError::database(message).with_source(e))
    }
}

/// Result type alias for returns desk operations
pub type Result<T> = std::result::Result<T, ReturnsError>;
