//! Error types for the query core.

use sift_codec::{CodecError, IndexValueType};
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while building, preparing or executing queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed query text.
    #[error("invalid query: {message} (query: {text:?})")]
    InvalidQuery {
        /// The offending query text.
        text: String,
        /// What went wrong.
        message: String,
    },

    /// A query that is not registered as safe was run by the system identity.
    #[error("query is not allowed to run as the system user: {text:?}")]
    SecurityViolation {
        /// The unregistered query text.
        text: String,
    },

    /// A `@N` placeholder refers past the supplied parameters.
    #[error("parameter @{index} is out of range, {count} parameter(s) supplied")]
    ParameterCountMismatch {
        /// The placeholder index.
        index: usize,
        /// Number of parameters supplied.
        count: usize,
    },

    /// The full query engine failed.
    #[error("query engine failure: {message}")]
    Engine {
        /// Error reported by the engine.
        message: String,
    },

    /// A document field holds a value of another type than requested.
    #[error("field {field} holds {actual}, requested {expected}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Requested type.
        expected: IndexValueType,
        /// Stored type.
        actual: IndexValueType,
    },

    /// A range predicate with neither bound.
    #[error("range on field {field} needs at least one bound")]
    InvalidRange {
        /// Field name.
        field: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation is invalid.
        message: String,
    },

    /// Encoding or decoding failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl QueryError {
    /// Creates an invalid query error.
    pub fn invalid_query(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Creates a security violation error.
    pub fn security_violation(text: impl Into<String>) -> Self {
        Self::SecurityViolation { text: text.into() }
    }

    /// Creates an engine failure.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Replaces the query text carried by an [`QueryError::InvalidQuery`].
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_query_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::InvalidQuery { message, .. } => Self::InvalidQuery {
                text: text.into(),
                message,
            },
            other => other,
        }
    }
}
