//! Error types for dialect loading and resolution

use std::path::PathBuf;

use thiserror::Error;

use crate::gate::SchemaError;
use crate::validators::ValidationFailure;

/// Result type for dialect operations
pub type Result<T> = std::result::Result<T, DialectError>;

/// Dialect loading errors. Every variant aborts the whole run.
#[derive(Error, Debug)]
pub enum DialectError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to resolve include '{include}' in definition '{including}' (expected '{expected}')")]
    UnresolvableInclude {
        including: String,
        include: String,
        expected: PathBuf,
    },

    #[error("Non-identical paths for message definition file '{filename}' ('{existing}' vs '{conflicting}')")]
    ConflictingDuplicate {
        filename: String,
        existing: PathBuf,
        conflicting: PathBuf,
    },

    #[error("Circular dependency detected involving '{from}' and its included dialect '{to}'")]
    CircularDependency { from: String, to: String },

    #[error("Unknown type '{type_name}' for field '{field}' in message '{message}'")]
    UnknownFieldType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("Malformed type '{type_decl}' for field '{field}' in message '{message}': {reason}")]
    MalformedFieldType {
        message: String,
        field: String,
        type_decl: String,
        reason: String,
    },

    #[error("{validator} failed validation: {source}")]
    Validation {
        validator: String,
        #[source]
        source: ValidationFailure,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
