//! Error types for reconcile-core

use thiserror::Error;

/// Result type alias using reconcile-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reconcile-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conflict not found
    #[error("Conflict not found: {0}")]
    NotFound(String),

    /// Conflict was already resolved; resolution is one-way
    #[error("Conflict already resolved: {0}")]
    AlreadyResolved(String),

    /// No writer registered for the conflict's table
    #[error("No writer registered for table '{0}'")]
    UnsupportedTable(String),

    /// The chosen strategy cannot produce a record without a human
    #[error("Conflict {0} requires manual resolution")]
    ManualResolutionRequired(String),

    /// Resolution stopped after some steps were already applied
    #[error("Conflict {conflict_id} partially applied: {detail}")]
    PartialApplication {
        /// Conflict whose resolution is incomplete
        conflict_id: String,
        /// Which step failed and why
        detail: String,
    },
}

impl Error {
    /// Whether the error came from the backing store rather than from input
    /// or resolution state.
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_) | Self::LibSql(_) | Self::Io(_))
    }
}
