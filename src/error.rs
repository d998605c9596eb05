//! Error types for rtconf

use thiserror::Error;

/// Result type alias for rtconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rtconf operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key already exists: {0}")]
    KeyExists(String),

    #[error("Bucket conflict: {0}")]
    BucketConflict(String),

    #[error("Not a leaf: {0}")]
    NotALeaf(String),

    /// The key did not exist, and removing the nodes created while
    /// looking for it failed as well.
    #[error("Key not found: {key}; rollback failed: {source}")]
    Internal {
        key: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Whether this error means the requested path did not resolve to a value
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_) | Error::NotALeaf(_))
    }
}
