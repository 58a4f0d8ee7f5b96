//! Error types for schema loading and compilation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid schema '{schema}': {reason}")]
    Invalid { schema: String, reason: String },

    #[error("Tool '{tool}' is defined more than once")]
    DuplicateTool { tool: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
