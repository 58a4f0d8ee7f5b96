use thiserror::Error;

/// Top-level error type for loregraph tool calls.
#[derive(Error, Debug)]
pub enum LoreError {
    #[error("Invalid argument '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    #[error("Node already exists: {0}")]
    Conflict(String),

    #[error("Tool registry not initialized: {0}")]
    Initialization(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Graph file I/O failed for {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt graph store at line {line}: {reason}")]
    CorruptStore { line: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn node_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            what: "Node",
            name: name.into(),
        }
    }

    pub fn edge_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            what: "Edge",
            name: name.into(),
        }
    }

    /// The taxonomy name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Conflict(_) => "ConflictError",
            Self::Initialization(_) => "InitializationError",
            Self::UnknownTool(_) => "UnknownToolError",
            Self::Persistence { .. } => "PersistenceError",
            Self::CorruptStore { .. } => "CorruptStoreError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

pub type Result<T> = std::result::Result<T, LoreError>;
